//! Region descriptors: requests to map one contiguous virtual range.

use crate::{
    HumanSize, PhysicalAddress, TableRef, VirtualAddress,
    layout::{SECTION_SHIFT, SECTION_SIZE, SMALL_PAGE_SHIFT, SMALL_PAGE_SIZE},
};

/// Granule a region is mapped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    /// 1 MiB section, mapped directly from a Level-1 table.
    Section,
    /// 4 KiB small page, mapped from a Level-2 table.
    Small,
}

impl PageSize {
    /// Returns the page size in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Section => SECTION_SIZE,
            Self::Small => SMALL_PAGE_SIZE,
        }
    }

    /// Returns log2 of the page size.
    pub const fn shift(self) -> u32 {
        match self {
            Self::Section => SECTION_SHIFT,
            Self::Small => SMALL_PAGE_SHIFT,
        }
    }
}

/// AP[1:0] access permissions (AP[2] is always clear).
///
/// Variant names read `<privileged>_<user>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AccessPermission {
    NoAccess = 0b00,
    ReadWriteNone = 0b01,
    ReadWriteReadOnly = 0b10,
    ReadWriteReadWrite = 0b11,
}

impl AccessPermission {
    /// Decodes the two AP bits.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Self::NoAccess,
            0b01 => Self::ReadWriteNone,
            0b10 => Self::ReadWriteReadOnly,
            _ => Self::ReadWriteReadWrite,
        }
    }

    /// Returns the two AP bits.
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// C and B bits (TEX is always zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CachePolicy {
    /// Uncached, unbuffered.
    StronglyOrdered = 0b00,
    /// Shareable device memory, buffered writes.
    Device = 0b01,
    /// Write-through, no write-allocate.
    WriteThrough = 0b10,
    /// Write-back, no write-allocate.
    WriteBack = 0b11,
}

impl CachePolicy {
    /// Decodes the C and B bits (`C` in bit 1).
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Self::StronglyOrdered,
            0b01 => Self::Device,
            0b10 => Self::WriteThrough,
            _ => Self::WriteBack,
        }
    }

    /// Returns the C and B bits (`C` in bit 1).
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// A request to map `page_count` pages of `page_size` from `virt` to `phys`.
///
/// A region is a transient value: it is built, handed to the
/// [`encoder`](crate::encoder), and dropped. Validation happens in the encoder,
/// where the owning table's level decides which alignments apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region<'t> {
    virt: VirtualAddress,
    phys: PhysicalAddress,
    page_size: PageSize,
    page_count: usize,
    access: AccessPermission,
    cache: CachePolicy,
    table: TableRef<'t>,
}

impl<'t> Region<'t> {
    /// Creates a region with no access and strongly-ordered memory.
    pub const fn new(
        table: TableRef<'t>,
        virt: VirtualAddress,
        phys: PhysicalAddress,
        page_size: PageSize,
        page_count: usize,
    ) -> Self {
        Self {
            virt,
            phys,
            page_size,
            page_count,
            access: AccessPermission::NoAccess,
            cache: CachePolicy::StronglyOrdered,
            table,
        }
    }

    /// Creates an identity-mapped region covering `size` bytes from `start`.
    pub const fn identity(table: TableRef<'t>, start: u32, size: u32, page_size: PageSize) -> Self {
        Self::new(
            table,
            VirtualAddress::new(start),
            PhysicalAddress::new(start),
            page_size,
            (size / page_size.bytes()) as usize,
        )
    }

    /// Sets the access permissions.
    pub const fn with_access(mut self, access: AccessPermission) -> Self {
        self.access = access;
        self
    }

    /// Sets the cache policy.
    pub const fn with_cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    pub const fn virtual_base(&self) -> VirtualAddress {
        self.virt
    }

    pub const fn physical_base(&self) -> PhysicalAddress {
        self.phys
    }

    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    pub const fn access(&self) -> AccessPermission {
        self.access
    }

    pub const fn cache(&self) -> CachePolicy {
        self.cache
    }

    pub const fn table(&self) -> TableRef<'t> {
        self.table
    }

    /// Returns the number of bytes the region covers, saturating at 4 GiB.
    pub fn size(&self) -> HumanSize {
        HumanSize((self.page_count as u64 * self.page_size.bytes() as u64).min(1 << 32))
    }
}
