//! Emulated register file.

use alloc::vec::Vec;

use crate::MmuRegisters;

/// One call made through [`MmuRegisters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    EnableWriteBuffer,
    MemorySize(u32),
    TranslationTableControl(u32),
    TranslationTableBase(u32),
    DomainAccessControl(u32),
    InvalidateTlb,
    ActivateTranslation,
}

/// Registers that only record what would have been written.
#[derive(Debug, Default)]
pub struct EmulatedRegisters {
    writes: Vec<RegisterWrite>,
}

impl EmulatedRegisters {
    /// Creates a register file with no recorded writes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded write, oldest first.
    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    /// Returns whether translation has been switched on.
    pub fn translation_enabled(&self) -> bool {
        self.writes.contains(&RegisterWrite::ActivateTranslation)
    }

    /// Returns the last value written to the table base register.
    pub fn translation_table_base(&self) -> Option<u32> {
        self.writes.iter().rev().find_map(|write| match write {
            RegisterWrite::TranslationTableBase(value) => Some(*value),
            _ => None,
        })
    }
}

impl MmuRegisters for EmulatedRegisters {
    fn enable_write_buffer(&mut self) {
        self.writes.push(RegisterWrite::EnableWriteBuffer);
    }

    fn set_memory_size(&mut self, bytes: u32) {
        self.writes.push(RegisterWrite::MemorySize(bytes));
    }

    fn set_translation_table_control(&mut self, bits: u32) {
        self.writes.push(RegisterWrite::TranslationTableControl(bits));
    }

    fn set_translation_table_base(&mut self, value: u32) {
        self.writes.push(RegisterWrite::TranslationTableBase(value));
    }

    fn set_domain_access_control(&mut self, value: u32) {
        self.writes.push(RegisterWrite::DomainAccessControl(value));
    }

    fn invalidate_tlb(&mut self) {
        self.writes.push(RegisterWrite::InvalidateTlb);
    }

    fn activate_translation(&mut self) {
        self.writes.push(RegisterWrite::ActivateTranslation);
    }
}
