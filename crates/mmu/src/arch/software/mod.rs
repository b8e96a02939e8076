//! Software emulation for testing and development.
//!
//! This module provides stand-ins for the two things the MMU layer touches on
//! real hardware: the memory that holds translation tables and the CP15/SDRC
//! registers that activate them. Both record what was done to them so tests can
//! assert on exact write sequences, not just on final state.

mod registers;

pub use registers::{EmulatedRegisters, RegisterWrite};

use alloc::vec::Vec;

use crate::{MmuError, PhysicalAddress, TableMemory, memory::check_window};

/// Emulated physical memory for table storage.
///
/// The buffer starts at an explicit physical `base` and every access is bounds
/// checked against it. Word writes are appended to a log in the order they
/// happen.
pub struct EmulatedMemory {
    /// Physical address of the first byte of `memory`.
    base: PhysicalAddress,
    /// The underlying memory buffer.
    memory: Vec<u8>,
    /// Every word write, in order.
    writes: Vec<(PhysicalAddress, u32)>,
}

impl EmulatedMemory {
    /// Creates a zeroed emulated memory region of `size` bytes starting at `base`.
    pub fn new(base: PhysicalAddress, size: u32) -> Self {
        Self {
            base,
            memory: alloc::vec![0u8; size as usize],
            writes: Vec::new(),
        }
    }

    /// Creates memory covering the kernel master table and all task table storage.
    pub fn page_table_storage() -> Self {
        use crate::layout::{OS_L1_PT_START, PAGE_TABLE_REGION_SIZE, TASK_L2_PT_START};

        let end = TASK_L2_PT_START + PAGE_TABLE_REGION_SIZE;
        Self::new(PhysicalAddress::new(OS_L1_PT_START), end - OS_L1_PT_START)
    }

    /// Returns the physical address of the first byte.
    pub fn base(&self) -> PhysicalAddress {
        self.base
    }

    /// Returns the size of the emulated memory region.
    pub fn size(&self) -> u32 {
        self.memory.len() as u32
    }

    /// Returns the raw contents.
    pub fn bytes(&self) -> &[u8] {
        &self.memory
    }

    /// Returns every word write so far, oldest first.
    pub fn write_log(&self) -> &[(PhysicalAddress, u32)] {
        &self.writes
    }

    /// Forgets the recorded writes, keeping the memory contents.
    pub fn clear_log(&mut self) {
        self.writes.clear();
    }

    fn offset(&self, addr: PhysicalAddress) -> Result<usize, MmuError> {
        self.check_range(addr, 4)?;
        Ok((addr - self.base) as usize)
    }
}

impl TableMemory for EmulatedMemory {
    fn read_word(&self, addr: PhysicalAddress) -> Result<u32, MmuError> {
        let offset = self.offset(addr)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.memory[offset..offset + 4]);
        Ok(u32::from_le_bytes(word))
    }

    fn write_word(&mut self, addr: PhysicalAddress, value: u32) -> Result<(), MmuError> {
        let offset = self.offset(addr)?;
        self.memory[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self.writes.push((addr, value));
        Ok(())
    }

    fn check_range(&self, addr: PhysicalAddress, len: u32) -> Result<(), MmuError> {
        check_window(self.base, self.size(), addr, len)
    }
}
