//! Runtime configuration for MMU bring-up.

use crate::{
    CachePolicy, Domain, DomainAccess, DomainAccessControl, MmuError,
    layout::{HW_START, MAX_PROCESSES, SDRAM_START, SECTION_SIZE, TASK_PHYS_START, TASK_REGION_SIZE, VM_TASK_START},
};

/// Values programmed into the hardware and descriptors during bring-up.
///
/// The memory layout itself is fixed in [`layout`](crate::layout); this only
/// carries the policy knobs around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmuConfig {
    /// Installed SDRAM in bytes.
    pub memory_size: u32,
    /// TTBCR value. Only the N field is used.
    pub table_control: u32,
    /// Domain of the kernel master table.
    pub kernel_domain: Domain,
    /// Domain of every task table.
    pub task_domain: Domain,
    /// DACR value.
    pub domain_access: DomainAccessControl,
    /// Cache policy of kernel code, data and table storage. Also used for table walks.
    pub kernel_cache: CachePolicy,
    /// Cache policy of the peripheral window.
    pub device_cache: CachePolicy,
    /// Cache policy of task memory.
    pub task_cache: CachePolicy,
}

impl MmuConfig {
    /// Largest SDRAM the SDRC chip select 0 window can hold.
    const MAX_MEMORY_SIZE: u32 = 0x4000_0000;
    /// Granule of the SDRC RAMSIZE field.
    const MEMORY_SIZE_UNIT: u32 = 2 * 1024 * 1024;
    const TABLE_CONTROL_N_MASK: u32 = 0b111;

    /// Returns the lowest virtual address translated through TTBR1.
    pub const fn kernel_split(&self) -> u64 {
        1u64 << (32 - (self.table_control & Self::TABLE_CONTROL_N_MASK))
    }

    /// Checks that this configuration can be programmed without breaking the layout.
    pub fn validate(&self) -> Result<(), MmuError> {
        if self.memory_size == 0 || self.memory_size % Self::MEMORY_SIZE_UNIT != 0 {
            return Err(MmuError::InvalidConfig("memory size must be a non-zero multiple of 2 MiB"));
        }
        if self.memory_size > Self::MAX_MEMORY_SIZE {
            return Err(MmuError::InvalidConfig("memory size exceeds the SDRAM window"));
        }
        let task_end = (TASK_PHYS_START + TASK_REGION_SIZE * MAX_PROCESSES as u32) as u64;
        if (SDRAM_START as u64 + self.memory_size as u64) < task_end {
            return Err(MmuError::InvalidConfig("memory size does not cover task memory"));
        }

        if self.table_control & !Self::TABLE_CONTROL_N_MASK != 0 {
            return Err(MmuError::InvalidConfig("only TTBCR.N may be set"));
        }
        let split = self.kernel_split();
        if self.table_control == 0
            || split < (VM_TASK_START + SECTION_SIZE) as u64
            || split > HW_START as u64
        {
            return Err(MmuError::InvalidConfig("TTBCR.N must split task space from kernel space"));
        }

        let shift = self.kernel_domain.id() as u32 * 2;
        if (self.domain_access.bits() >> shift) & 0b11 == DomainAccess::NoAccess as u32 {
            return Err(MmuError::InvalidConfig("kernel domain has no access"));
        }
        Ok(())
    }
}

impl Default for MmuConfig {
    fn default() -> Self {
        Self {
            memory_size: crate::layout::SDRAM_SIZE,
            table_control: 0b010,
            kernel_domain: Domain::default(),
            task_domain: Domain::default(),
            domain_access: DomainAccessControl::new().with(Domain::default(), DomainAccess::Manager),
            kernel_cache: CachePolicy::WriteBack,
            device_cache: CachePolicy::Device,
            task_cache: CachePolicy::WriteBack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = MmuConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.kernel_split(), 0x4000_0000);
        assert_eq!(config.domain_access.bits(), 0x3);
    }

    #[test]
    fn rejects_bad_memory_size() {
        let mut config = MmuConfig::default();
        config.memory_size = 0x0010_0000;
        assert!(matches!(config.validate(), Err(MmuError::InvalidConfig(_))));
        config.memory_size = 0x0400_0000;
        assert_eq!(
            config.validate(),
            Err(MmuError::InvalidConfig("memory size does not cover task memory"))
        );
        config.memory_size = 0x8000_0000;
        assert_eq!(
            config.validate(),
            Err(MmuError::InvalidConfig("memory size exceeds the SDRAM window"))
        );
    }

    #[test]
    fn rejects_split_inside_kernel_space() {
        let mut config = MmuConfig::default();
        config.table_control = 0b001;
        assert!(matches!(config.validate(), Err(MmuError::InvalidConfig(_))));
        config.table_control = 0;
        assert!(matches!(config.validate(), Err(MmuError::InvalidConfig(_))));
        config.table_control = 0b011;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_locked_out_kernel_domain() {
        let mut config = MmuConfig::default();
        config.kernel_domain = Domain::new(4).unwrap();
        assert_eq!(config.validate(), Err(MmuError::InvalidConfig("kernel domain has no access")));
    }
}
