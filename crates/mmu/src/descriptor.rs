//! Short-descriptor format translation table entries.
//!
//! Level-1 layouts:
//! - Section: bits 31-20 frame, 11-10 AP, 8-5 domain, 3-2 CB, 1-0 `0b10`
//! - Coarse table: bits 31-10 table base, 8-5 domain, 1-0 `0b01`
//!
//! Level-2 layout:
//! - Small page: bits 31-12 frame, 5-4 AP, 3-2 CB, 1-0 `0b10`
//!
//! A zero word is a fault descriptor at either level.

use crate::{AccessPermission, CachePolicy, Domain, PhysicalAddress};

/// What a descriptor word points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Translation fault.
    Fault,
    /// Level-1 entry referencing a coarse table.
    CoarseTable,
    /// Level-1 entry mapping a 1 MiB section.
    Section,
    /// Level-2 entry mapping a 4 KiB small page.
    SmallPage,
    /// Any tag this layer never writes.
    Unsupported,
}

/// A single 32-bit translation table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Descriptor(u32);

impl Descriptor {
    const TYPE_MASK: u32 = 0b11;
    const TYPE_COARSE: u32 = 0b01;
    const TYPE_SECTION: u32 = 0b10;
    const TYPE_SMALL_PAGE: u32 = 0b10;

    const SECTION_BASE_MASK: u32 = 0xFFF0_0000;
    const COARSE_BASE_MASK: u32 = 0xFFFF_FC00;
    const SMALL_PAGE_BASE_MASK: u32 = 0xFFFF_F000;

    const SECTION_AP_SHIFT: u32 = 10;
    const SMALL_PAGE_AP_SHIFT: u32 = 4;
    const DOMAIN_SHIFT: u32 = 5;
    const DOMAIN_MASK: u32 = 0xF;
    const CB_SHIFT: u32 = 2;

    /// The fault descriptor.
    pub const FAULT: Self = Self(0);

    /// Encodes a section descriptor mapping the 1 MiB frame containing `frame`.
    pub const fn section(
        frame: PhysicalAddress,
        access: AccessPermission,
        domain: Domain,
        cache: CachePolicy,
    ) -> Self {
        Self(
            (frame.as_u32() & Self::SECTION_BASE_MASK)
                | access.bits() << Self::SECTION_AP_SHIFT
                | (domain.id() as u32 & Self::DOMAIN_MASK) << Self::DOMAIN_SHIFT
                | cache.bits() << Self::CB_SHIFT
                | Self::TYPE_SECTION,
        )
    }

    /// Encodes a descriptor linking to the coarse table at `table`.
    ///
    /// Coarse descriptors carry no cache or permission bits; those live in the
    /// Level-2 entries.
    pub const fn coarse_table(table: PhysicalAddress, domain: Domain) -> Self {
        Self(
            (table.as_u32() & Self::COARSE_BASE_MASK)
                | (domain.id() as u32 & Self::DOMAIN_MASK) << Self::DOMAIN_SHIFT
                | Self::TYPE_COARSE,
        )
    }

    /// Encodes a small-page descriptor mapping the 4 KiB frame containing `frame`.
    pub const fn small_page(frame: PhysicalAddress, access: AccessPermission, cache: CachePolicy) -> Self {
        Self(
            (frame.as_u32() & Self::SMALL_PAGE_BASE_MASK)
                | access.bits() << Self::SMALL_PAGE_AP_SHIFT
                | cache.bits() << Self::CB_SHIFT
                | Self::TYPE_SMALL_PAGE,
        )
    }

    /// Returns the raw descriptor word.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Wraps a raw descriptor word.
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    /// Returns the two tag bits.
    pub const fn tag(self) -> u32 {
        self.0 & Self::TYPE_MASK
    }

    /// Classifies this word as a Level-1 entry.
    pub const fn l1_kind(self) -> DescriptorKind {
        match self.tag() {
            0b00 => DescriptorKind::Fault,
            Self::TYPE_COARSE => DescriptorKind::CoarseTable,
            Self::TYPE_SECTION => DescriptorKind::Section,
            _ => DescriptorKind::Unsupported,
        }
    }

    /// Classifies this word as a Level-2 entry.
    pub const fn l2_kind(self) -> DescriptorKind {
        match self.tag() {
            0b00 => DescriptorKind::Fault,
            // bit 0 is XN on small pages, which is never set here.
            Self::TYPE_SMALL_PAGE => DescriptorKind::SmallPage,
            _ => DescriptorKind::Unsupported,
        }
    }

    /// Returns the mapped frame of a section descriptor.
    pub const fn section_base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 & Self::SECTION_BASE_MASK)
    }

    /// Returns the table address of a coarse-table descriptor.
    pub const fn coarse_base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 & Self::COARSE_BASE_MASK)
    }

    /// Returns the mapped frame of a small-page descriptor.
    pub const fn small_page_base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 & Self::SMALL_PAGE_BASE_MASK)
    }

    /// Returns the domain field of a Level-1 descriptor.
    pub const fn domain(self) -> u8 {
        ((self.0 >> Self::DOMAIN_SHIFT) & Self::DOMAIN_MASK) as u8
    }

    /// Returns the access permissions of a section descriptor.
    pub const fn section_access(self) -> AccessPermission {
        AccessPermission::from_bits(self.0 >> Self::SECTION_AP_SHIFT)
    }

    /// Returns the access permissions of a small-page descriptor.
    pub const fn small_page_access(self) -> AccessPermission {
        AccessPermission::from_bits(self.0 >> Self::SMALL_PAGE_AP_SHIFT)
    }

    /// Returns the cache policy of a section or small-page descriptor.
    pub const fn cache(self) -> CachePolicy {
        CachePolicy::from_bits(self.0 >> Self::CB_SHIFT)
    }
}

impl From<u32> for Descriptor {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_bit_layout() {
        let entry = Descriptor::section(
            PhysicalAddress::new(0x8030_0000),
            AccessPermission::ReadWriteNone,
            Domain::new(2).unwrap(),
            CachePolicy::WriteBack,
        );
        assert_eq!(entry.as_u32(), 0x8030_0000 | 0b01 << 10 | 2 << 5 | 0b11 << 2 | 0b10);
        assert_eq!(entry.l1_kind(), DescriptorKind::Section);
        assert_eq!(entry.section_base(), PhysicalAddress::new(0x8030_0000));
        assert_eq!(entry.section_access(), AccessPermission::ReadWriteNone);
        assert_eq!(entry.domain(), 2);
        assert_eq!(entry.cache(), CachePolicy::WriteBack);
    }

    #[test]
    fn section_drops_offset_bits() {
        let entry = Descriptor::section(
            PhysicalAddress::new(0x4812_3456),
            AccessPermission::NoAccess,
            Domain::default(),
            CachePolicy::StronglyOrdered,
        );
        assert_eq!(entry.as_u32(), 0x4810_0002);
    }

    #[test]
    fn coarse_table_bit_layout() {
        let entry = Descriptor::coarse_table(PhysicalAddress::new(0x8110_0C00), Domain::new(15).unwrap());
        assert_eq!(entry.as_u32(), 0x8110_0C00 | 15 << 5 | 0b01);
        assert_eq!(entry.l1_kind(), DescriptorKind::CoarseTable);
        assert_eq!(entry.coarse_base(), PhysicalAddress::new(0x8110_0C00));
        assert_eq!(entry.domain(), 15);
    }

    #[test]
    fn small_page_bit_layout() {
        let entry = Descriptor::small_page(
            PhysicalAddress::new(0x8200_5000),
            AccessPermission::ReadWriteReadWrite,
            CachePolicy::WriteThrough,
        );
        assert_eq!(entry.as_u32(), 0x8200_5000 | 0b11 << 4 | 0b10 << 2 | 0b10);
        assert_eq!(entry.l2_kind(), DescriptorKind::SmallPage);
        assert_eq!(entry.small_page_base(), PhysicalAddress::new(0x8200_5000));
        assert_eq!(entry.small_page_access(), AccessPermission::ReadWriteReadWrite);
        assert_eq!(entry.cache(), CachePolicy::WriteThrough);
    }

    #[test]
    fn fault_is_zero() {
        assert_eq!(Descriptor::FAULT.as_u32(), 0);
        assert_eq!(Descriptor::FAULT.l1_kind(), DescriptorKind::Fault);
        assert_eq!(Descriptor::from(0b11).l1_kind(), DescriptorKind::Unsupported);
    }
}
