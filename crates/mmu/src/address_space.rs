//! Per-process address spaces.
//!
//! Each process slot owns a fixed Level-1 table, a fixed Level-2 table and a
//! fixed 1 MiB window of physical memory. A process image is linked at
//! [`VM_TASK_START`] and mapped with small pages through its one coarse table,
//! so a process is at most 1 MiB.

use core::fmt;

use crate::{
    AccessPermission, CoarseTable, MasterTable, MmuConfig, MmuError, MmuRegisters, PageSize, PhysicalAddress, Region,
    TableMemory, TableRef, VirtualAddress, encoder,
    layout::{
        DESCRIPTOR_SIZE, L1_TABLE_SIZE, L2_ENTRY_COUNT, L2_TABLE_SIZE, MAX_PROCESS_PAGES, MAX_PROCESSES, SMALL_PAGE_SIZE, VM_TASK_START,
        task_frames, task_l1_table, task_l2_table,
    },
};

/// Index of a process slot, below [`MAX_PROCESSES`].
pub type ProcessId = usize;

/// Occupancy of the process slots, one bit per slot.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessSlots(u64);

impl ProcessSlots {
    pub const fn new() -> Self {
        Self(0)
    }

    /// Returns whether slot `id` is allocated. Ids past the last slot are never allocated.
    pub const fn is_used(&self, id: ProcessId) -> bool {
        id < MAX_PROCESSES && self.0 & (1 << id) != 0
    }

    /// Returns the number of allocated slots.
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns an iterator over the allocated slot ids, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = ProcessId> + '_ {
        (0..MAX_PROCESSES).filter(|&id| self.is_used(id))
    }

    fn check_free(&self, id: ProcessId) -> Result<(), MmuError> {
        if id >= MAX_PROCESSES {
            return Err(MmuError::InvalidProcess(id));
        }
        if self.is_used(id) {
            return Err(MmuError::SlotInUse(id));
        }
        Ok(())
    }

    fn check_used(&self, id: ProcessId) -> Result<(), MmuError> {
        if id >= MAX_PROCESSES {
            return Err(MmuError::InvalidProcess(id));
        }
        if !self.is_used(id) {
            return Err(MmuError::SlotFree(id));
        }
        Ok(())
    }

    fn claim(&mut self, id: ProcessId) {
        self.0 |= 1 << id;
    }

    fn release(&mut self, id: ProcessId) {
        self.0 &= !(1 << id);
    }
}

impl fmt::Debug for ProcessSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// The translation tables of one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAddressSpace {
    id: ProcessId,
    master: MasterTable,
    coarse: CoarseTable,
}

impl ProcessAddressSpace {
    /// Describes the tables of slot `id` sized for `pages` small pages.
    fn for_slot(id: ProcessId, pages: usize, config: &MmuConfig) -> Result<Self, MmuError> {
        let master = MasterTable::new(PhysicalAddress::new(task_l1_table(id)), config.task_domain)?;
        let coarse = CoarseTable::new(
            PhysicalAddress::new(task_l2_table(id)),
            VirtualAddress::new(VM_TASK_START),
            &master,
            pages,
        )?;
        Ok(Self { id, master, coarse })
    }

    pub const fn id(&self) -> ProcessId {
        self.id
    }

    /// The process's Level-1 table.
    pub const fn master(&self) -> &MasterTable {
        &self.master
    }

    /// The process's Level-2 table, linked at [`VM_TASK_START`].
    pub const fn coarse(&self) -> &CoarseTable {
        &self.coarse
    }

    /// Number of 4 KiB pages mapped.
    pub const fn page_count(&self) -> usize {
        self.coarse.page_count()
    }

    /// Physical base of the memory backing the process image.
    pub const fn frames(&self) -> PhysicalAddress {
        PhysicalAddress::new(task_frames(self.id))
    }

    /// Returns the small-page region mapping the process image.
    pub fn image_region(&self, config: &MmuConfig) -> Region<'_> {
        Region::new(
            TableRef::Coarse(&self.coarse),
            self.coarse.virtual_base(),
            self.frames(),
            PageSize::Small,
            self.page_count(),
        )
        .with_access(AccessPermission::ReadWriteReadWrite)
        .with_cache(config.task_cache)
    }

    /// Returns the region linking the coarse table into the master table.
    pub fn link_region(&self) -> Region<'_> {
        Region::new(
            TableRef::Master(&self.master),
            self.coarse.virtual_base(),
            self.coarse.base(),
            PageSize::Small,
            1,
        )
    }
}

/// Number of small pages needed for `size_kb` KiB.
pub const fn pages_for(size_kb: usize) -> usize {
    size_kb.div_ceil((SMALL_PAGE_SIZE / 1024) as usize)
}

/// Creates the address space of process `id`, sized for `size_kb` KiB.
///
/// The request is checked in this order: id range, size, slot occupancy. The
/// Level-2 table is fully written before it is linked into the Level-1 table.
/// Nothing is written if the request is rejected.
pub fn add_process<M: TableMemory + ?Sized>(
    memory: &mut M,
    slots: &mut ProcessSlots,
    config: &MmuConfig,
    id: ProcessId,
    size_kb: usize,
) -> Result<ProcessAddressSpace, MmuError> {
    if id >= MAX_PROCESSES {
        return Err(MmuError::InvalidProcess(id));
    }
    let pages = pages_for(size_kb);
    if pages == 0 {
        return Err(MmuError::EmptyRegion);
    }
    if pages > MAX_PROCESS_PAGES {
        return Err(MmuError::CapacityExceeded {
            requested: pages,
            limit: MAX_PROCESS_PAGES,
        });
    }
    slots.check_free(id)?;
    let space = ProcessAddressSpace::for_slot(id, pages, config)?;

    memory.check_range(space.master.base(), L1_TABLE_SIZE)?;
    memory.check_range(space.coarse.base(), L2_TABLE_SIZE)?;

    space.master.clear(memory)?;
    space.coarse.clear(memory)?;
    encoder::write_small_pages(memory, &space.image_region(config))?;
    encoder::write_table(memory, &space.link_region())?;

    slots.claim(id);
    log::info!(
        "process {}: {} pages at {} backed by {}, L1 {} L2 {}",
        id,
        pages,
        space.coarse.virtual_base(),
        space.frames(),
        space.master.base(),
        space.coarse.base()
    );
    Ok(space)
}

/// Tears down the address space of process `id` and frees its slot.
///
/// The link is cut first so the Level-2 table is unreachable while it is
/// being cleared. The TLB is invalidated once both tables are empty.
pub fn remove_process<M, R>(
    memory: &mut M,
    registers: &mut R,
    slots: &mut ProcessSlots,
    config: &MmuConfig,
    id: ProcessId,
) -> Result<(), MmuError>
where
    M: TableMemory + ?Sized,
    R: MmuRegisters + ?Sized,
{
    slots.check_used(id)?;
    let space = ProcessAddressSpace::for_slot(id, L2_ENTRY_COUNT, config)?;

    memory.check_range(space.master.base(), L1_TABLE_SIZE)?;
    memory.check_range(space.coarse.base(), L2_TABLE_SIZE)?;

    let link = space.master.base() + space.coarse.master_slot() as u32 * DESCRIPTOR_SIZE;
    memory.write_word(link, 0)?;
    space.coarse.clear(memory)?;
    space.master.clear(memory)?;
    registers.invalidate_tlb();

    slots.release(id);
    log::info!("process {}: removed", id);
    Ok(())
}
