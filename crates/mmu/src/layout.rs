//! Fixed physical and virtual memory layout of the OMAP3530 kernel.
//!
//! Boot code relies on these addresses, so they are static. Every table slot is
//! computed as `base + id * slot_size`.

/// Size of a section (Level-1 granule).
pub const SECTION_SIZE: u32 = 0x10_0000;
/// log2 of [`SECTION_SIZE`].
pub const SECTION_SHIFT: u32 = 20;

/// Size of a small page (Level-2 granule).
pub const SMALL_PAGE_SIZE: u32 = 0x1000;
/// log2 of [`SMALL_PAGE_SIZE`].
pub const SMALL_PAGE_SHIFT: u32 = 12;

/// Entries in a Level-1 (master) table, one per 1 MiB of the 4 GiB space.
pub const L1_ENTRY_COUNT: usize = 4096;
/// Entries in a Level-2 (coarse) table, one per 4 KiB page of a 1 MiB window.
pub const L2_ENTRY_COUNT: usize = 256;

/// Bytes in one descriptor word.
pub const DESCRIPTOR_SIZE: u32 = 4;

/// Size and required alignment of a Level-1 table.
pub const L1_TABLE_SIZE: u32 = L1_ENTRY_COUNT as u32 * DESCRIPTOR_SIZE;
/// Size and required alignment of a Level-2 table.
pub const L2_TABLE_SIZE: u32 = L2_ENTRY_COUNT as u32 * DESCRIPTOR_SIZE;

/// L4 interconnect window (L4-Core, L4-Wakeup and L4-Per peripherals).
pub const HW_START: u32 = 0x4800_0000;
pub const HW_SIZE: u32 = 0x0200_0000;

/// Start of SDRAM on the OMAP3530.
pub const SDRAM_START: u32 = 0x8000_0000;
/// SDRAM fitted to the board (BeagleBoard rev C).
pub const SDRAM_SIZE: u32 = 0x1000_0000;

/// Kernel code and data, identity mapped.
pub const KERNEL_START: u32 = SDRAM_START;
pub const KERNEL_SIZE: u32 = 0x0100_0000;

/// The kernel's own master table, at the top of the kernel window.
pub const OS_L1_PT_START: u32 = 0x80F0_0000;

/// Size of each page-table storage region.
pub const PAGE_TABLE_REGION_SIZE: u32 = 0x10_0000;

/// Storage for per-task Level-1 tables.
pub const TASK_L1_PT_START: u32 = 0x8100_0000;
pub const TASK_L1_PT_SIZE: u32 = L1_TABLE_SIZE;

/// Storage for per-task Level-2 tables.
pub const TASK_L2_PT_START: u32 = TASK_L1_PT_START + PAGE_TABLE_REGION_SIZE;
pub const TASK_L2_PT_SIZE: u32 = L2_TABLE_SIZE;

/// Physical memory handed out to tasks, one window per process slot.
pub const TASK_PHYS_START: u32 = 0x8200_0000;
pub const TASK_REGION_SIZE: u32 = SECTION_SIZE;

/// Virtual address every task is linked at.
pub const VM_TASK_START: u32 = 0x0010_0000;

/// Number of process slots. Bounded by the Level-1 storage region.
pub const MAX_PROCESSES: usize = (PAGE_TABLE_REGION_SIZE / TASK_L1_PT_SIZE) as usize;

/// Largest process a single coarse table can describe.
pub const MAX_PROCESS_PAGES: usize = L2_ENTRY_COUNT;

const _: () = {
    assert!(OS_L1_PT_START % L1_TABLE_SIZE == 0);
    assert!(OS_L1_PT_START >= KERNEL_START && OS_L1_PT_START + L1_TABLE_SIZE <= KERNEL_START + KERNEL_SIZE);
    assert!(TASK_L1_PT_START % SECTION_SIZE == 0);
    assert!(TASK_L2_PT_START % SECTION_SIZE == 0);
    assert!(TASK_L2_PT_SIZE as usize * MAX_PROCESSES <= PAGE_TABLE_REGION_SIZE as usize);
    assert!(TASK_PHYS_START + TASK_REGION_SIZE * MAX_PROCESSES as u32 <= SDRAM_START + SDRAM_SIZE);
    assert!(VM_TASK_START % SECTION_SIZE == 0);
    assert!(MAX_PROCESSES <= 64);
};

/// Address of the Level-1 table owned by process slot `id`.
#[inline]
pub const fn task_l1_table(id: usize) -> u32 {
    TASK_L1_PT_START + id as u32 * TASK_L1_PT_SIZE
}

/// Address of the Level-2 table owned by process slot `id`.
#[inline]
pub const fn task_l2_table(id: usize) -> u32 {
    TASK_L2_PT_START + id as u32 * TASK_L2_PT_SIZE
}

/// Physical memory window backing process slot `id`.
#[inline]
pub const fn task_frames(id: usize) -> u32 {
    TASK_PHYS_START + id as u32 * TASK_REGION_SIZE
}
