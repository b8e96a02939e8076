//! Level-1 (master) and Level-2 (coarse) page table models.
//!
//! A table model only records where a table lives and which domain it belongs
//! to. The entries themselves live in [`TableMemory`](crate::TableMemory) and are
//! written by the [`encoder`](crate::encoder).

use crate::{
    MmuError, PhysicalAddress, TableMemory, VirtualAddress,
    layout::{DESCRIPTOR_SIZE, L1_ENTRY_COUNT, L1_TABLE_SIZE, L2_ENTRY_COUNT, L2_TABLE_SIZE, SECTION_SIZE},
};

/// An ARM access-control domain (0..=15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Domain(u8);

impl Domain {
    /// Number of domains the DACR controls.
    pub const COUNT: u8 = 16;

    /// Creates a domain, rejecting identifiers above 15.
    pub const fn new(id: u8) -> Result<Self, MmuError> {
        if id < Self::COUNT {
            Ok(Self(id))
        } else {
            Err(MmuError::InvalidDomain(id))
        }
    }

    /// Returns the domain identifier.
    pub const fn id(self) -> u8 {
        self.0
    }
}

/// Writes `count` fault (zero) descriptors starting at `base`.
fn clear_words<M: TableMemory + ?Sized>(
    memory: &mut M,
    base: PhysicalAddress,
    count: usize,
) -> Result<(), MmuError> {
    memory.check_range(base, count as u32 * DESCRIPTOR_SIZE)?;
    for index in 0..count {
        memory.write_word(base + index as u32 * DESCRIPTOR_SIZE, 0)?;
    }
    Ok(())
}

/// A Level-1 table: 4096 descriptors, one per 1 MiB of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterTable {
    base: PhysicalAddress,
    domain: Domain,
}

impl MasterTable {
    /// Describes a master table at `base`. The base must be 16 KiB aligned.
    pub fn new(base: PhysicalAddress, domain: Domain) -> Result<Self, MmuError> {
        if !base.is_aligned(L1_TABLE_SIZE) {
            return Err(MmuError::misaligned_physical(base, L1_TABLE_SIZE));
        }
        Ok(Self { base, domain })
    }

    /// Returns the physical address of this table.
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    /// Returns the domain every descriptor in this table is tagged with.
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Returns the number of entries in this table.
    pub const fn len(&self) -> usize {
        L1_ENTRY_COUNT
    }

    /// Returns the physical address of slot `index`.
    ///
    /// # Panics
    /// Panics if index >= 4096.
    pub fn slot_address(&self, index: usize) -> PhysicalAddress {
        assert!(index < L1_ENTRY_COUNT, "page table index out of bounds");
        self.base + index as u32 * DESCRIPTOR_SIZE
    }

    /// Reads the descriptor word in slot `index`.
    pub fn entry<M: TableMemory + ?Sized>(&self, memory: &M, index: usize) -> Result<u32, MmuError> {
        memory.read_word(self.slot_address(index))
    }

    /// Sets every entry to a fault descriptor.
    pub fn clear<M: TableMemory + ?Sized>(&self, memory: &mut M) -> Result<(), MmuError> {
        clear_words(memory, self.base, L1_ENTRY_COUNT)
    }
}

/// A Level-2 table: 256 small-page descriptors covering one 1 MiB window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoarseTable {
    base: PhysicalAddress,
    virt: VirtualAddress,
    domain: Domain,
    master: PhysicalAddress,
    page_count: usize,
}

impl CoarseTable {
    /// Describes a coarse table at `base` that translates the 1 MiB window at `virt`
    /// and is linked from `master`.
    ///
    /// `base` must be 1 KiB aligned, `virt` section aligned and `page_count` at most 256.
    pub fn new(
        base: PhysicalAddress,
        virt: VirtualAddress,
        master: &MasterTable,
        page_count: usize,
    ) -> Result<Self, MmuError> {
        if !base.is_aligned(L2_TABLE_SIZE) {
            return Err(MmuError::misaligned_physical(base, L2_TABLE_SIZE));
        }
        if !virt.is_aligned(SECTION_SIZE) {
            return Err(MmuError::misaligned_virtual(virt, SECTION_SIZE));
        }
        if page_count > L2_ENTRY_COUNT {
            return Err(MmuError::CapacityExceeded {
                requested: page_count,
                limit: L2_ENTRY_COUNT,
            });
        }
        Ok(Self {
            base,
            virt,
            domain: master.domain(),
            master: master.base(),
            page_count,
        })
    }

    /// Returns the physical address of this table.
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    /// Returns the first virtual address this table translates.
    pub const fn virtual_base(&self) -> VirtualAddress {
        self.virt
    }

    /// Returns the domain inherited from the owning master table.
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Returns the physical address of the owning master table.
    pub const fn master(&self) -> PhysicalAddress {
        self.master
    }

    /// Returns the number of pages this table is sized for.
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Returns the master-table slot that links to this table.
    pub const fn master_slot(&self) -> usize {
        self.virt.section_index()
    }

    /// Returns the physical address of slot `index`.
    ///
    /// # Panics
    /// Panics if index >= 256.
    pub fn slot_address(&self, index: usize) -> PhysicalAddress {
        assert!(index < L2_ENTRY_COUNT, "page table index out of bounds");
        self.base + index as u32 * DESCRIPTOR_SIZE
    }

    /// Reads the descriptor word in slot `index`.
    pub fn entry<M: TableMemory + ?Sized>(&self, memory: &M, index: usize) -> Result<u32, MmuError> {
        memory.read_word(self.slot_address(index))
    }

    /// Sets every entry to a fault descriptor.
    pub fn clear<M: TableMemory + ?Sized>(&self, memory: &mut M) -> Result<(), MmuError> {
        clear_words(memory, self.base, L2_ENTRY_COUNT)
    }
}

/// The table a [`Region`](crate::Region) is written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRef<'t> {
    Master(&'t MasterTable),
    Coarse(&'t CoarseTable),
}

impl TableRef<'_> {
    /// Returns the physical address of the referenced table.
    pub fn base(&self) -> PhysicalAddress {
        match self {
            Self::Master(table) => table.base(),
            Self::Coarse(table) => table.base(),
        }
    }

    /// Returns the domain of the referenced table.
    pub fn domain(&self) -> Domain {
        match self {
            Self::Master(table) => table.domain(),
            Self::Coarse(table) => table.domain(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::EmulatedMemory;

    fn master() -> MasterTable {
        MasterTable::new(PhysicalAddress::new(0x8100_4000), Domain::default()).unwrap()
    }

    #[test]
    fn domain_range() {
        assert_eq!(Domain::new(15).map(Domain::id), Ok(15));
        assert_eq!(Domain::new(16), Err(MmuError::InvalidDomain(16)));
    }

    #[test]
    fn master_table_must_be_16k_aligned() {
        let err = MasterTable::new(PhysicalAddress::new(0x8100_2000), Domain::default());
        assert_eq!(
            err,
            Err(MmuError::misaligned_physical(PhysicalAddress::new(0x8100_2000), 0x4000))
        );
    }

    #[test]
    fn master_slot_addresses() {
        let table = master();
        assert_eq!(table.slot_address(0), PhysicalAddress::new(0x8100_4000));
        assert_eq!(table.slot_address(0x800), PhysicalAddress::new(0x8100_6000));
        assert_eq!(table.len(), 4096);
    }

    #[test]
    #[should_panic(expected = "page table index out of bounds")]
    fn master_slot_out_of_bounds() {
        master().slot_address(4096);
    }

    #[test]
    fn coarse_table_inherits_master() {
        let l1 = MasterTable::new(PhysicalAddress::new(0x8100_4000), Domain::new(3).unwrap()).unwrap();
        let l2 = CoarseTable::new(
            PhysicalAddress::new(0x8110_0400),
            VirtualAddress::new(0x0010_0000),
            &l1,
            16,
        )
        .unwrap();
        assert_eq!(l2.domain(), Domain::new(3).unwrap());
        assert_eq!(l2.master(), l1.base());
        assert_eq!(l2.master_slot(), 1);
        assert_eq!(l2.slot_address(255), PhysicalAddress::new(0x8110_07FC));
    }

    #[test]
    fn coarse_table_rejects_oversize_and_misalignment() {
        let l1 = master();
        assert_eq!(
            CoarseTable::new(PhysicalAddress::new(0x8110_0000), VirtualAddress::new(0x0010_0000), &l1, 257),
            Err(MmuError::CapacityExceeded {
                requested: 257,
                limit: 256
            })
        );
        assert_eq!(
            CoarseTable::new(PhysicalAddress::new(0x8110_0200), VirtualAddress::new(0x0010_0000), &l1, 1),
            Err(MmuError::misaligned_physical(PhysicalAddress::new(0x8110_0200), 0x400))
        );
        assert_eq!(
            CoarseTable::new(PhysicalAddress::new(0x8110_0000), VirtualAddress::new(0x0010_1000), &l1, 1),
            Err(MmuError::misaligned_virtual(VirtualAddress::new(0x0010_1000), 0x10_0000))
        );
    }

    #[test]
    fn clear_zeroes_every_entry() {
        let mut memory = EmulatedMemory::new(PhysicalAddress::new(0x8100_0000), 0x8000);
        let table = master();
        for index in [0, 17, 4095] {
            memory.write_word(table.slot_address(index), 0xDEAD_BEEF).unwrap();
        }
        table.clear(&mut memory).unwrap();
        for index in [0, 17, 4095] {
            assert_eq!(table.entry(&memory, index), Ok(0));
        }
    }

    #[test]
    fn clear_outside_memory_writes_nothing() {
        let mut memory = EmulatedMemory::new(PhysicalAddress::new(0x8100_4000), 0x2000);
        let result = master().clear(&mut memory);
        assert!(matches!(result, Err(MmuError::OutOfMemoryBounds(_))));
        assert!(memory.write_log().is_empty());
    }
}
