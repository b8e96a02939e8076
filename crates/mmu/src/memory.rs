//! Access to the memory that holds translation tables.

use crate::{MmuError, PhysicalAddress, layout::DESCRIPTOR_SIZE};

/// Word-granular access to page-table memory, addressed physically.
///
/// Implementations must reject addresses they cannot back rather than touch
/// them. The encoder calls [`check_range`](Self::check_range) before its first
/// write so a rejected request never leaves a partially written table.
pub trait TableMemory {
    /// Reads the descriptor word at `addr`.
    fn read_word(&self, addr: PhysicalAddress) -> Result<u32, MmuError>;

    /// Writes the descriptor word at `addr`.
    fn write_word(&mut self, addr: PhysicalAddress, value: u32) -> Result<(), MmuError>;

    /// Checks that `len` bytes from `addr` can be accessed.
    fn check_range(&self, addr: PhysicalAddress, len: u32) -> Result<(), MmuError>;
}

/// Table memory reached through a fixed physical-to-virtual offset.
///
/// Before translation is enabled the offset is zero. Once the kernel window is
/// mapped it is whatever the kernel space maps table storage at.
pub struct DirectMemory {
    direct_map_offset: usize,
    start: PhysicalAddress,
    len: u32,
}

impl DirectMemory {
    /// Creates a view of `len` bytes of table memory starting at `start`.
    ///
    /// # Safety
    /// For every physical address `p` in `start..start + len`, the virtual
    /// address `p + direct_map_offset` must be mapped, writable, and reserved
    /// for translation tables for the lifetime of this value.
    pub const unsafe fn new(start: PhysicalAddress, len: u32, direct_map_offset: usize) -> Self {
        Self {
            direct_map_offset,
            start,
            len,
        }
    }

    fn word_ptr(&self, addr: PhysicalAddress) -> Result<*mut u32, MmuError> {
        self.check_range(addr, DESCRIPTOR_SIZE)?;
        Ok(addr.as_usize().wrapping_add(self.direct_map_offset) as *mut u32)
    }
}

impl TableMemory for DirectMemory {
    fn read_word(&self, addr: PhysicalAddress) -> Result<u32, MmuError> {
        let ptr = self.word_ptr(addr)?;
        // SAFETY: The range was checked and the constructor's contract makes it valid.
        Ok(unsafe { ptr.read_volatile() })
    }

    fn write_word(&mut self, addr: PhysicalAddress, value: u32) -> Result<(), MmuError> {
        let ptr = self.word_ptr(addr)?;
        // SAFETY: The range was checked and the constructor's contract makes it valid.
        unsafe { ptr.write_volatile(value) };
        Ok(())
    }

    fn check_range(&self, addr: PhysicalAddress, len: u32) -> Result<(), MmuError> {
        check_window(self.start, self.len, addr, len)
    }
}

/// Checks that `addr..addr + len` is word aligned and lies in `start..start + size`.
pub(crate) fn check_window(
    start: PhysicalAddress,
    size: u32,
    addr: PhysicalAddress,
    len: u32,
) -> Result<(), MmuError> {
    if !addr.is_aligned(DESCRIPTOR_SIZE) {
        return Err(MmuError::misaligned_physical(addr, DESCRIPTOR_SIZE));
    }
    let offset = (addr.as_u32() as u64).wrapping_sub(start.as_u32() as u64);
    if addr < start || offset + len as u64 > size as u64 {
        return Err(MmuError::OutOfMemoryBounds(addr));
    }
    Ok(())
}
