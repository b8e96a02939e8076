//! Writes encoded descriptors for a [`Region`] into its owning table.
//!
//! Every operation validates the whole request and checks the target words
//! against the table memory before the first write, so a rejected request
//! leaves memory untouched. Entries are written from the last slot down to the
//! first. The order carries no hardware meaning but is fixed, so identical
//! requests always produce the same sequence of word writes.

use crate::{
    CoarseTable, Descriptor, MasterTable, MmuError, PageSize, PhysicalAddress, Region, TableMemory, TableRef,
    layout::{DESCRIPTOR_SIZE, L1_ENTRY_COUNT, L2_ENTRY_COUNT, L2_TABLE_SIZE, SECTION_SIZE, SMALL_PAGE_SIZE},
};

/// A validated run of consecutive slots in one table.
struct SlotRun {
    table: PhysicalAddress,
    first_slot: usize,
    count: usize,
}

impl SlotRun {
    fn new(table: PhysicalAddress, first_slot: usize, count: usize, slots: usize) -> Result<Self, MmuError> {
        if count == 0 {
            return Err(MmuError::EmptyRegion);
        }
        if first_slot + count > slots {
            return Err(MmuError::OutOfTableBounds {
                first_slot,
                count,
                slots,
            });
        }
        Ok(Self {
            table,
            first_slot,
            count,
        })
    }

    fn slot_address(&self, index: usize) -> PhysicalAddress {
        self.table + (self.first_slot + index) as u32 * DESCRIPTOR_SIZE
    }

    /// Writes `encode(i)` into slot `first_slot + i`, last slot first.
    fn write<M, F>(&self, memory: &mut M, encode: F) -> Result<(), MmuError>
    where
        M: TableMemory + ?Sized,
        F: Fn(u32) -> Descriptor,
    {
        memory.check_range(self.slot_address(0), self.count as u32 * DESCRIPTOR_SIZE)?;
        for index in (0..self.count).rev() {
            memory.write_word(self.slot_address(index), encode(index as u32).as_u32())?;
        }
        Ok(())
    }
}

/// Checks that `count` granules of `stride` bytes starting at `phys` stay inside 4 GiB.
fn check_physical_run(phys: PhysicalAddress, stride: u32, count: usize) -> Result<(), MmuError> {
    let end = phys.as_u32() as u64 + stride as u64 * count as u64;
    if end > 1 << 32 {
        return Err(MmuError::OutOfMemoryBounds(phys));
    }
    Ok(())
}

fn master_table<'t>(region: &Region<'t>) -> Result<&'t MasterTable, MmuError> {
    match region.table() {
        TableRef::Master(table) => Ok(table),
        TableRef::Coarse(_) => Err(MmuError::WrongTableKind),
    }
}

fn coarse_table<'t>(region: &Region<'t>) -> Result<&'t CoarseTable, MmuError> {
    match region.table() {
        TableRef::Coarse(table) => Ok(table),
        TableRef::Master(_) => Err(MmuError::WrongTableKind),
    }
}

/// Writes section descriptors mapping `region` 1 MiB at a time.
///
/// Slot `(virt >> 20) + i` maps the frame `phys + (i << 20)`.
pub fn write_section<M: TableMemory + ?Sized>(memory: &mut M, region: &Region<'_>) -> Result<(), MmuError> {
    let table = master_table(region)?;
    if region.page_size() != PageSize::Section {
        return Err(MmuError::PageSizeMismatch);
    }

    let virt = region.virtual_base();
    let phys = region.physical_base();
    if !virt.is_aligned(SECTION_SIZE) {
        return Err(MmuError::misaligned_virtual(virt, SECTION_SIZE));
    }
    if !phys.is_aligned(SECTION_SIZE) {
        return Err(MmuError::misaligned_physical(phys, SECTION_SIZE));
    }

    let run = SlotRun::new(table.base(), virt.section_index(), region.page_count(), L1_ENTRY_COUNT)?;
    check_physical_run(phys, SECTION_SIZE, run.count)?;

    log::trace!(
        "section map {} -> {} ({}) into L1 {}",
        virt,
        phys,
        region.size(),
        table.base()
    );

    let (access, domain, cache) = (region.access(), table.domain(), region.cache());
    run.write(memory, |index| {
        Descriptor::section(phys + (index << 20), access, domain, cache)
    })
}

/// Writes coarse-table descriptors linking `region` to Level-2 tables.
///
/// Slot `(virt >> 20) + i` references the table at `phys + (i << 10)`, so a
/// multi-entry region links consecutive 1 KiB tables. The region's page size
/// is that of the linked tables and must be [`PageSize::Small`].
pub fn write_table<M: TableMemory + ?Sized>(memory: &mut M, region: &Region<'_>) -> Result<(), MmuError> {
    let table = master_table(region)?;
    if region.page_size() != PageSize::Small {
        return Err(MmuError::PageSizeMismatch);
    }

    let virt = region.virtual_base();
    let phys = region.physical_base();
    if !virt.is_aligned(SECTION_SIZE) {
        return Err(MmuError::misaligned_virtual(virt, SECTION_SIZE));
    }
    if !phys.is_aligned(L2_TABLE_SIZE) {
        return Err(MmuError::misaligned_physical(phys, L2_TABLE_SIZE));
    }

    let run = SlotRun::new(table.base(), virt.section_index(), region.page_count(), L1_ENTRY_COUNT)?;
    check_physical_run(phys, L2_TABLE_SIZE, run.count)?;

    log::trace!(
        "linking {} coarse table(s) at {} for {} into L1 {}",
        run.count,
        phys,
        virt,
        table.base()
    );

    let domain = table.domain();
    run.write(memory, |index| Descriptor::coarse_table(phys + (index << 10), domain))
}

/// Writes small-page descriptors mapping `region` into its coarse table.
///
/// Slot `((virt >> 12) & 0xFF) + i` maps the frame `phys + (i << 12)`. The
/// region must lie inside the table's 1 MiB window and may not map more pages
/// than the table was sized for.
pub fn write_small_pages<M: TableMemory + ?Sized>(memory: &mut M, region: &Region<'_>) -> Result<(), MmuError> {
    let table = coarse_table(region)?;
    if region.page_size() != PageSize::Small {
        return Err(MmuError::PageSizeMismatch);
    }

    let virt = region.virtual_base();
    let phys = region.physical_base();
    if !virt.is_aligned(SMALL_PAGE_SIZE) {
        return Err(MmuError::misaligned_virtual(virt, SMALL_PAGE_SIZE));
    }
    if !phys.is_aligned(SMALL_PAGE_SIZE) {
        return Err(MmuError::misaligned_physical(phys, SMALL_PAGE_SIZE));
    }
    if virt.align_down(SECTION_SIZE) != table.virtual_base() {
        return Err(MmuError::OutsideTableWindow(virt));
    }
    if region.page_count() > table.page_count() {
        return Err(MmuError::CapacityExceeded {
            requested: region.page_count(),
            limit: table.page_count(),
        });
    }

    let run = SlotRun::new(table.base(), virt.small_page_index(), region.page_count(), L2_ENTRY_COUNT)?;
    check_physical_run(phys, SMALL_PAGE_SIZE, run.count)?;

    log::trace!(
        "small-page map {} -> {} ({}) into L2 {}",
        virt,
        phys,
        region.size(),
        table.base()
    );

    let (access, cache) = (region.access(), region.cache());
    run.write(memory, |index| Descriptor::small_page(phys + (index << 12), access, cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AccessPermission, CachePolicy, DescriptorKind, Domain, VirtualAddress, arch::EmulatedMemory,
    };

    const L1: u32 = 0x8100_4000;
    const L2: u32 = 0x8110_0400;

    fn memory() -> EmulatedMemory {
        EmulatedMemory::new(PhysicalAddress::new(0x8100_0000), 0x0020_0000)
    }

    fn master() -> MasterTable {
        MasterTable::new(PhysicalAddress::new(L1), Domain::new(1).unwrap()).unwrap()
    }

    fn sections(table: &MasterTable, virt: u32, phys: u32, count: usize) -> Region<'_> {
        Region::new(
            TableRef::Master(table),
            VirtualAddress::new(virt),
            PhysicalAddress::new(phys),
            PageSize::Section,
            count,
        )
        .with_access(AccessPermission::ReadWriteNone)
        .with_cache(CachePolicy::WriteBack)
    }

    #[test]
    fn section_words_land_in_consecutive_slots() {
        let mut mem = memory();
        let table = master();
        write_section(&mut mem, &sections(&table, 0x8000_0000, 0x8000_0000, 3)).unwrap();

        for i in 0..3u32 {
            let word = mem.read_word(PhysicalAddress::new(L1 + 4 * (0x800 + i))).unwrap();
            let entry = Descriptor::from_u32(word);
            assert_eq!(entry.l1_kind(), DescriptorKind::Section);
            assert_eq!(entry.section_base(), PhysicalAddress::new(0x8000_0000 + (i << 20)));
            assert_eq!(entry.section_access(), AccessPermission::ReadWriteNone);
            assert_eq!(entry.domain(), 1);
            assert_eq!(entry.cache(), CachePolicy::WriteBack);
        }
        // Neighbours stay untouched.
        assert_eq!(mem.read_word(PhysicalAddress::new(L1 + 4 * 0x7FF)), Ok(0));
        assert_eq!(mem.read_word(PhysicalAddress::new(L1 + 4 * 0x803)), Ok(0));
    }

    #[test]
    fn section_writes_descend() {
        let mut mem = memory();
        let table = master();
        write_section(&mut mem, &sections(&table, 0x0030_0000, 0x8050_0000, 3)).unwrap();

        let expected_base: u32 = 0x8050_0000 | 0b01 << 10 | 1 << 5 | 0b11 << 2 | 0b10;
        assert_eq!(
            mem.write_log(),
            &[
                (PhysicalAddress::new(L1 + 4 * 5), expected_base + (2 << 20)),
                (PhysicalAddress::new(L1 + 4 * 4), expected_base + (1 << 20)),
                (PhysicalAddress::new(L1 + 4 * 3), expected_base),
            ]
        );
    }

    #[test]
    fn section_write_is_idempotent() {
        let mut first = memory();
        let mut second = memory();
        let table = master();
        let region = sections(&table, 0x4800_0000, 0x4800_0000, 32);

        write_section(&mut first, &region).unwrap();
        write_section(&mut second, &region).unwrap();
        write_section(&mut second, &region).unwrap();

        assert_eq!(first.bytes(), second.bytes());
        assert_eq!(second.write_log()[..32], second.write_log()[32..]);
    }

    #[test]
    fn section_rejects_misaligned_addresses() {
        let mut mem = memory();
        let table = master();

        let err = write_section(&mut mem, &sections(&table, 0x0030_1000, 0x8050_0000, 1));
        assert_eq!(err, Err(MmuError::misaligned_virtual(VirtualAddress::new(0x0030_1000), SECTION_SIZE)));

        let err = write_section(&mut mem, &sections(&table, 0x0030_0000, 0x8050_8000, 1));
        assert_eq!(err, Err(MmuError::misaligned_physical(PhysicalAddress::new(0x8050_8000), SECTION_SIZE)));

        assert!(mem.write_log().is_empty());
    }

    #[test]
    fn section_rejects_overrun_and_empty() {
        let mut mem = memory();
        let table = master();

        let err = write_section(&mut mem, &sections(&table, 0xFFE0_0000, 0x8000_0000, 3));
        assert_eq!(
            err,
            Err(MmuError::OutOfTableBounds {
                first_slot: 0xFFE,
                count: 3,
                slots: 4096
            })
        );
        assert_eq!(
            write_section(&mut mem, &sections(&table, 0, 0, 0)),
            Err(MmuError::EmptyRegion)
        );
        assert_eq!(
            write_section(&mut mem, &sections(&table, 0, 0xFFF0_0000, 2)),
            Err(MmuError::OutOfMemoryBounds(PhysicalAddress::new(0xFFF0_0000)))
        );
        assert!(mem.write_log().is_empty());
    }

    #[test]
    fn section_requires_section_pages_in_master_table() {
        let mut mem = memory();
        let l1 = master();
        let l2 = CoarseTable::new(PhysicalAddress::new(L2), VirtualAddress::new(0x0010_0000), &l1, 4).unwrap();

        let small = Region::new(
            TableRef::Master(&l1),
            VirtualAddress::new(0),
            PhysicalAddress::new(0),
            PageSize::Small,
            1,
        );
        assert_eq!(write_section(&mut mem, &small), Err(MmuError::PageSizeMismatch));

        let wrong_table = Region::new(
            TableRef::Coarse(&l2),
            VirtualAddress::new(0),
            PhysicalAddress::new(0),
            PageSize::Section,
            1,
        );
        assert_eq!(write_section(&mut mem, &wrong_table), Err(MmuError::WrongTableKind));
    }

    #[test]
    fn section_outside_memory_writes_nothing() {
        let mut mem = EmulatedMemory::new(PhysicalAddress::new(L1), 0x10);
        let table = master();
        let err = write_section(&mut mem, &sections(&table, 0x0020_0000, 0x8000_0000, 4));
        assert!(matches!(err, Err(MmuError::OutOfMemoryBounds(_))));
        assert!(mem.write_log().is_empty());
    }

    #[test]
    fn table_links_coarse_tables() {
        let mut mem = memory();
        let table = master();
        let region = Region::new(
            TableRef::Master(&table),
            VirtualAddress::new(0x0010_0000),
            PhysicalAddress::new(L2),
            PageSize::Small,
            2,
        );
        write_table(&mut mem, &region).unwrap();

        assert_eq!(
            mem.write_log(),
            &[
                (PhysicalAddress::new(L1 + 8), (L2 + 0x400) | 1 << 5 | 0b01),
                (PhysicalAddress::new(L1 + 4), L2 | 1 << 5 | 0b01),
            ]
        );
        for (_, word) in mem.write_log() {
            assert_eq!(word & 0b11, 0b01);
        }
    }

    #[test]
    fn table_requires_1k_aligned_target() {
        let mut mem = memory();
        let table = master();
        let region = Region::new(
            TableRef::Master(&table),
            VirtualAddress::new(0x0010_0000),
            PhysicalAddress::new(L2 + 0x200),
            PageSize::Small,
            1,
        );
        assert_eq!(
            write_table(&mut mem, &region),
            Err(MmuError::misaligned_physical(PhysicalAddress::new(L2 + 0x200), L2_TABLE_SIZE))
        );
    }

    #[test]
    fn table_requires_section_aligned_virtual_base() {
        let mut mem = memory();
        let table = master();
        let region = Region::new(
            TableRef::Master(&table),
            VirtualAddress::new(0x0010_4000),
            PhysicalAddress::new(L2),
            PageSize::Small,
            1,
        );
        assert_eq!(
            write_table(&mut mem, &region),
            Err(MmuError::misaligned_virtual(VirtualAddress::new(0x0010_4000), SECTION_SIZE))
        );
        assert!(mem.write_log().is_empty());
    }

    #[test]
    fn table_links_small_page_tables_only() {
        let mut mem = memory();
        let table = master();
        let region = Region::new(
            TableRef::Master(&table),
            VirtualAddress::new(0x0010_0000),
            PhysicalAddress::new(L2),
            PageSize::Section,
            1,
        );
        assert_eq!(write_table(&mut mem, &region), Err(MmuError::PageSizeMismatch));
        assert!(mem.write_log().is_empty());
    }

    #[test]
    fn small_pages_require_aligned_frames() {
        let mut mem = memory();
        let l1 = master();
        let l2 = CoarseTable::new(PhysicalAddress::new(L2), VirtualAddress::new(0x0010_0000), &l1, 4).unwrap();
        let region = Region::new(
            TableRef::Coarse(&l2),
            VirtualAddress::new(0x0010_0000),
            PhysicalAddress::new(0x8200_0800),
            PageSize::Small,
            1,
        );
        assert_eq!(
            write_small_pages(&mut mem, &region),
            Err(MmuError::misaligned_physical(PhysicalAddress::new(0x8200_0800), SMALL_PAGE_SIZE))
        );
        assert!(mem.write_log().is_empty());
    }

    #[test]
    fn small_pages_fill_coarse_table() {
        let mut mem = memory();
        let l1 = master();
        let l2 = CoarseTable::new(PhysicalAddress::new(L2), VirtualAddress::new(0x0010_0000), &l1, 4).unwrap();
        let region = Region::new(
            TableRef::Coarse(&l2),
            VirtualAddress::new(0x0010_2000),
            PhysicalAddress::new(0x8200_0000),
            PageSize::Small,
            2,
        )
        .with_access(AccessPermission::ReadWriteReadWrite)
        .with_cache(CachePolicy::WriteBack);
        write_small_pages(&mut mem, &region).unwrap();

        let page: u32 = 0x8200_0000 | 0b11 << 4 | 0b11 << 2 | 0b10;
        assert_eq!(
            mem.write_log(),
            &[
                (PhysicalAddress::new(L2 + 4 * 3), page + 0x1000),
                (PhysicalAddress::new(L2 + 4 * 2), page),
            ]
        );
        let entry = Descriptor::from_u32(l2.entry(&mem, 3).unwrap());
        assert_eq!(entry.l2_kind(), DescriptorKind::SmallPage);
        assert_eq!(entry.small_page_base(), PhysicalAddress::new(0x8200_1000));
    }

    #[test]
    fn small_pages_stay_in_window_and_capacity() {
        let mut mem = memory();
        let l1 = master();
        let l2 = CoarseTable::new(PhysicalAddress::new(L2), VirtualAddress::new(0x0010_0000), &l1, 2).unwrap();
        let region = |virt: u32, count: usize| {
            Region::new(
                TableRef::Coarse(&l2),
                VirtualAddress::new(virt),
                PhysicalAddress::new(0x8200_0000),
                PageSize::Small,
                count,
            )
        };

        assert_eq!(
            write_small_pages(&mut mem, &region(0x0020_0000, 1)),
            Err(MmuError::OutsideTableWindow(VirtualAddress::new(0x0020_0000)))
        );
        assert_eq!(
            write_small_pages(&mut mem, &region(0x0010_0000, 3)),
            Err(MmuError::CapacityExceeded {
                requested: 3,
                limit: 2
            })
        );
        assert_eq!(
            write_small_pages(&mut mem, &region(0x001F_F000, 2)),
            Err(MmuError::OutOfTableBounds {
                first_slot: 255,
                count: 2,
                slots: 256
            })
        );
        assert_eq!(
            write_small_pages(&mut mem, &region(0x0010_0800, 1)),
            Err(MmuError::misaligned_virtual(VirtualAddress::new(0x0010_0800), SMALL_PAGE_SIZE))
        );
        assert!(mem.write_log().is_empty());
    }
}
