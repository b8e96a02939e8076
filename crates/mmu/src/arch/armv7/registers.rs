//! CP15 and SDRC register access.

use core::arch::asm;

use crate::MmuRegisters;

/// SDRC_MCFG_0: memory configuration for chip select 0.
const SDRC_MCFG: *mut u32 = 0x6D00_0080 as *mut u32;

/// RAMSIZE field of SDRC_MCFG, counted in 2 MiB units.
const SDRC_RAMSIZE_SHIFT: u32 = 8;
const SDRC_RAMSIZE_MASK: u32 = 0x3FF << SDRC_RAMSIZE_SHIFT;
const SDRC_RAMSIZE_UNIT: u32 = 2 * 1024 * 1024;

/// SCTLR bits touched during bring-up.
const SCTLR_M: u32 = 1 << 0;
const SCTLR_W: u32 = 1 << 3;

/// The real CP15 register file of the running core.
pub struct Cp15Registers {
    _private: (),
}

impl Cp15Registers {
    /// Takes ownership of the MMU control registers.
    ///
    /// # Safety
    /// Only one instance may exist, and it must only be used from privileged
    /// mode on the boot core.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn read_sctlr(&self) -> u32 {
        let value: u32;
        // SAFETY: Reading SCTLR has no side effects.
        unsafe {
            asm!("mrc p15, 0, {0}, c1, c0, 0", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        value
    }

    fn write_sctlr(&mut self, value: u32) {
        // SAFETY: Guaranteed privileged by the constructor's contract.
        unsafe {
            asm!(
                "mcr p15, 0, {0}, c1, c0, 0",
                "isb",
                in(reg) value,
                options(nostack, preserves_flags)
            );
        }
    }
}

impl MmuRegisters for Cp15Registers {
    fn enable_write_buffer(&mut self) {
        let sctlr = self.read_sctlr();
        self.write_sctlr(sctlr | SCTLR_W);
    }

    fn set_memory_size(&mut self, bytes: u32) {
        let units = bytes / SDRC_RAMSIZE_UNIT;
        // SAFETY: SDRC_MCFG is a device register in the L3 window and the
        // constructor's contract makes this the only writer.
        unsafe {
            let value = SDRC_MCFG.read_volatile() & !SDRC_RAMSIZE_MASK;
            SDRC_MCFG.write_volatile(value | (units << SDRC_RAMSIZE_SHIFT) & SDRC_RAMSIZE_MASK);
        }
    }

    fn set_translation_table_control(&mut self, bits: u32) {
        // SAFETY: TTBCR only takes effect once translation is enabled.
        unsafe {
            asm!("mcr p15, 0, {0}, c2, c0, 2", in(reg) bits, options(nostack, preserves_flags));
        }
    }

    fn set_translation_table_base(&mut self, value: u32) {
        // SAFETY: The caller installs a fully built master table.
        unsafe {
            asm!("mcr p15, 0, {0}, c2, c0, 1", in(reg) value, options(nostack, preserves_flags));
        }
    }

    fn set_domain_access_control(&mut self, value: u32) {
        // SAFETY: Guaranteed privileged by the constructor's contract.
        unsafe {
            asm!("mcr p15, 0, {0}, c3, c0, 0", "isb", in(reg) value, options(nostack, preserves_flags));
        }
    }

    fn invalidate_tlb(&mut self) {
        // SAFETY: TLBIALL ignores its operand.
        unsafe {
            asm!(
                "mcr p15, 0, {0}, c8, c7, 0",
                "dsb",
                "isb",
                in(reg) 0u32,
                options(nostack, preserves_flags)
            );
        }
    }

    fn activate_translation(&mut self) {
        self.invalidate_tlb();
        let sctlr = self.read_sctlr();
        self.write_sctlr(sctlr | SCTLR_M);
    }
}
