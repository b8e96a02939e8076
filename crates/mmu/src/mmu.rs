//! MMU bring-up and the process table.

use crate::{
    MasterTable, MmuConfig, MmuError, MmuRegisters, ProcessAddressSpace, ProcessId, ProcessSlots, TableMemory,
    address_space, kernel_space::build_kernel_space, registers::translation_table_base,
};

/// Owns the register interface and the memory the translation tables live in.
///
/// The kernel keeps exactly one of these. Every table write and register
/// write of the system goes through it.
pub struct Mmu<R, M> {
    registers: R,
    memory: M,
    config: MmuConfig,
    kernel_table: Option<MasterTable>,
    processes: ProcessSlots,
}

impl<R: MmuRegisters, M: TableMemory> Mmu<R, M> {
    /// Creates an MMU handle. Nothing is written until [`Mmu::init`].
    pub const fn new(registers: R, memory: M, config: MmuConfig) -> Self {
        Self {
            registers,
            memory,
            config,
            kernel_table: None,
            processes: ProcessSlots::new(),
        }
    }

    /// Builds the kernel address space and turns translation on.
    ///
    /// Registers are written in this order: write buffer, memory size, table
    /// control, table base, domain access, then translation enable. The table
    /// base is only written once the kernel table is complete, so a failure
    /// leaves translation off.
    pub fn init(&mut self) -> Result<(), MmuError> {
        if self.kernel_table.is_some() {
            return Err(MmuError::AlreadyInitialized);
        }
        self.config.validate().inspect_err(|err| {
            log::error!("refusing to enable the MMU: {}", err);
        })?;

        self.registers.enable_write_buffer();
        self.registers.set_memory_size(self.config.memory_size);
        self.registers.set_translation_table_control(self.config.table_control);

        let table = build_kernel_space(&mut self.memory, &self.config).inspect_err(|err| {
            log::error!("failed to build the kernel address space: {}", err);
        })?;
        let ttbr = translation_table_base(table.base(), self.config.kernel_cache)?;

        self.registers.set_translation_table_base(ttbr);
        self.registers.set_domain_access_control(self.config.domain_access.bits());
        self.registers.activate_translation();

        log::info!(
            "MMU enabled: kernel table {}, TTBR {:#010x}, DACR {:#010x}",
            table.base(),
            ttbr,
            self.config.domain_access.bits()
        );
        self.kernel_table = Some(table);
        Ok(())
    }

    /// Creates the address space of process `id`, sized for `size_kb` KiB.
    pub fn add_process(&mut self, id: ProcessId, size_kb: usize) -> Result<ProcessAddressSpace, MmuError> {
        self.kernel_table()?;
        address_space::add_process(&mut self.memory, &mut self.processes, &self.config, id, size_kb)
    }

    /// Tears down the address space of process `id`.
    pub fn remove_process(&mut self, id: ProcessId) -> Result<(), MmuError> {
        self.kernel_table()?;
        address_space::remove_process(
            &mut self.memory,
            &mut self.registers,
            &mut self.processes,
            &self.config,
            id,
        )
    }

    /// The kernel master table, once [`Mmu::init`] succeeded.
    pub fn kernel_table(&self) -> Result<&MasterTable, MmuError> {
        self.kernel_table.as_ref().ok_or(MmuError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.kernel_table.is_some()
    }

    pub fn processes(&self) -> &ProcessSlots {
        &self.processes
    }

    pub fn config(&self) -> &MmuConfig {
        &self.config
    }

    pub fn registers(&self) -> &R {
        &self.registers
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }
}
