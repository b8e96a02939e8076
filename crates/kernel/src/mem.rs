//! The kernel's handle on the MMU.
//!
//! There is one [`Mmu`] for the whole system. It lives behind a spin lock so
//! process creation and teardown from different contexts are serialized.

use omap_mmu::{HumanSize, Mmu, MmuError, MmuRegisters, ProcessAddressSpace, ProcessId, TableMemory};
use spin::Mutex;

pub struct MmuService<R, M> {
    mmu: Mutex<Mmu<R, M>>,
}

impl<R: MmuRegisters, M: TableMemory> MmuService<R, M> {
    pub const fn new(mmu: Mmu<R, M>) -> Self {
        Self { mmu: Mutex::new(mmu) }
    }

    /// Builds the kernel address space and enables translation.
    pub fn init(&self) -> Result<(), MmuError> {
        let mut mmu = self.mmu.lock();
        mmu.init()?;
        log::info!(
            "kernel address space ready: {} SDRAM, kernel/task split at {:#x}",
            HumanSize::from(mmu.config().memory_size),
            mmu.config().kernel_split()
        );
        Ok(())
    }

    /// Creates an address space for a process image of `size_kb` KiB.
    pub fn spawn(&self, id: ProcessId, size_kb: usize) -> Result<ProcessAddressSpace, MmuError> {
        self.mmu.lock().add_process(id, size_kb).inspect_err(|err| {
            log::warn!("process {}: cannot create address space: {}", id, err);
        })
    }

    /// Releases the address space of process `id`.
    pub fn reap(&self, id: ProcessId) -> Result<(), MmuError> {
        self.mmu.lock().remove_process(id)
    }

    /// Runs `f` with the MMU locked.
    pub fn with<T>(&self, f: impl FnOnce(&Mmu<R, M>) -> T) -> T {
        f(&self.mmu.lock())
    }
}

#[cfg(target_arch = "arm")]
mod hardware {
    use omap_mmu::{
        DirectMemory, Mmu, MmuConfig, MmuError, PhysicalAddress,
        arch::Cp15Registers,
        layout::{OS_L1_PT_START, PAGE_TABLE_REGION_SIZE, TASK_L2_PT_START},
    };
    use spin::Once;

    use super::MmuService;

    pub type KernelMmu = MmuService<Cp15Registers, DirectMemory>;

    static MMU: Once<KernelMmu> = Once::new();

    /// Returns the kernel's MMU service, creating it on first use.
    pub fn mmu() -> &'static KernelMmu {
        MMU.call_once(|| {
            let start = PhysicalAddress::new(OS_L1_PT_START);
            let len = TASK_L2_PT_START + PAGE_TABLE_REGION_SIZE - OS_L1_PT_START;
            // SAFETY: Table storage is identity mapped before and after translation is
            // enabled and is reserved for tables by the layout. This is the only
            // Cp15Registers in the system.
            let (registers, memory) = unsafe { (Cp15Registers::new(), DirectMemory::new(start, len, 0)) };
            MmuService::new(Mmu::new(registers, memory, MmuConfig::default()))
        })
    }

    pub fn init() -> Result<&'static KernelMmu, MmuError> {
        let service = mmu();
        service.init()?;
        Ok(service)
    }
}

#[cfg(target_arch = "arm")]
pub use hardware::{KernelMmu, init, mmu};
