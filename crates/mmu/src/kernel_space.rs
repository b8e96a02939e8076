//! The kernel's fixed address space.
//!
//! Built once at boot before any task exists: peripherals, the kernel image and
//! the two page-table storage regions, all identity mapped with sections.
//!
//! The table-storage regions are section mapped rather than linked through
//! coarse tables. The kernel needs flat read-write access to every task table,
//! and a section gives it that with one descriptor per megabyte.

use crate::{
    AccessPermission, MasterTable, MmuConfig, MmuError, PageSize, PhysicalAddress, Region, TableMemory, TableRef,
    encoder,
    layout::{
        HW_SIZE, HW_START, KERNEL_SIZE, KERNEL_START, OS_L1_PT_START, PAGE_TABLE_REGION_SIZE, TASK_L1_PT_START,
        TASK_L2_PT_START,
    },
};

/// Returns the regions of the kernel address space, in the order they are written.
pub fn kernel_regions<'t>(table: &'t MasterTable, config: &MmuConfig) -> [Region<'t>; 4] {
    let table = TableRef::Master(table);
    [
        Region::identity(table, HW_START, HW_SIZE, PageSize::Section)
            .with_access(AccessPermission::ReadWriteReadWrite)
            .with_cache(config.device_cache),
        Region::identity(table, KERNEL_START, KERNEL_SIZE, PageSize::Section)
            .with_access(AccessPermission::ReadWriteNone)
            .with_cache(config.kernel_cache),
        Region::identity(table, TASK_L1_PT_START, PAGE_TABLE_REGION_SIZE, PageSize::Section)
            .with_access(AccessPermission::ReadWriteNone)
            .with_cache(config.kernel_cache),
        Region::identity(table, TASK_L2_PT_START, PAGE_TABLE_REGION_SIZE, PageSize::Section)
            .with_access(AccessPermission::ReadWriteNone)
            .with_cache(config.kernel_cache),
    ]
}

/// Builds the kernel master table at [`OS_L1_PT_START`].
///
/// Every entry is first reset to a fault descriptor, then the fixed regions are
/// written. Running this twice produces identical table contents, but it must
/// not run while tasks depend on the table.
pub fn build_kernel_space<M: TableMemory + ?Sized>(
    memory: &mut M,
    config: &MmuConfig,
) -> Result<MasterTable, MmuError> {
    let table = MasterTable::new(PhysicalAddress::new(OS_L1_PT_START), config.kernel_domain)?;
    table.clear(memory)?;

    for region in kernel_regions(&table, config) {
        log::debug!(
            "kernel map {} ({}) {:?} {:?}",
            region.virtual_base(),
            region.size(),
            region.access(),
            region.cache()
        );
        encoder::write_section(memory, &region)?;
    }

    Ok(table)
}
