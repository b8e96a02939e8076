//! The privileged register interface used to activate translation tables.
//!
//! Everything behind [`MmuRegisters`] is a single register write with no
//! failure mode. The values written are computed here so they can be tested on
//! the host.

use crate::{CachePolicy, Domain, MmuError, PhysicalAddress, layout::L1_TABLE_SIZE};

/// Register writes needed to bring up the MMU.
///
/// [`Mmu::init`](crate::Mmu::init) calls these in a fixed order: enable write
/// buffer, set memory size, set table control, (build tables), set table base,
/// set domain access, activate.
pub trait MmuRegisters {
    /// Enables the write buffer.
    fn enable_write_buffer(&mut self);

    /// Programs the SDRAM controller with the installed memory size.
    fn set_memory_size(&mut self, bytes: u32);

    /// Writes the translation table base control register (TTBCR).
    fn set_translation_table_control(&mut self, bits: u32);

    /// Writes the kernel translation table base register (TTBR1).
    fn set_translation_table_base(&mut self, value: u32);

    /// Writes the domain access control register (DACR).
    fn set_domain_access_control(&mut self, value: u32);

    /// Invalidates the unified TLB.
    fn invalidate_tlb(&mut self);

    /// Sets SCTLR.M, enabling translation.
    fn activate_translation(&mut self);
}

/// Access a domain grants, as programmed into the DACR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DomainAccess {
    /// Every access generates a domain fault.
    NoAccess = 0b00,
    /// Accesses are checked against the descriptor's AP bits.
    Client = 0b01,
    /// Accesses are not checked.
    Manager = 0b11,
}

/// Builder for the domain access control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct DomainAccessControl(u32);

impl DomainAccessControl {
    /// Every domain denies access.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Sets the access for one domain.
    pub const fn with(self, domain: Domain, access: DomainAccess) -> Self {
        let shift = domain.id() as u32 * 2;
        Self((self.0 & !(0b11 << shift)) | (access as u32) << shift)
    }

    /// Returns the raw register value.
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Encodes a TTBR value for the master table at `base`.
///
/// The table walk is made inner cacheable and the outer region attribute takes
/// the cache policy's C and B bits.
pub fn translation_table_base(base: PhysicalAddress, walk_cache: CachePolicy) -> Result<u32, MmuError> {
    if !base.is_aligned(L1_TABLE_SIZE) {
        return Err(MmuError::misaligned_physical(base, L1_TABLE_SIZE));
    }
    const INNER_CACHEABLE: u32 = 1 << 0;
    const RGN_SHIFT: u32 = 3;
    Ok(base.as_u32() | walk_cache.bits() << RGN_SHIFT | INNER_CACHEABLE)
}
