//! Address types for physical and virtual memory on a 32-bit ARMv7 core.
//!
//! Both address spaces are 32 bits wide, so every `u32` is a valid address. The
//! newtypes only exist to keep physical and virtual values from being mixed up
//! when descriptors are encoded.

use core::fmt;
use core::ops::{Add, Sub};

use crate::layout::{L2_ENTRY_COUNT, SECTION_SHIFT, SMALL_PAGE_SHIFT};

/// Writes `value` as uppercase hex with a `_` separator between the upper and
/// lower 16 bits, e.g. `0x8000_0000`.
fn write_grouped_hex(f: &mut fmt::Formatter<'_>, value: u32) -> fmt::Result {
    let high = value >> 16;
    let low = value & 0xFFFF;
    if high == 0 {
        write!(f, "{:#X}", low)
    } else {
        write!(f, "0x{:X}_{:04X}", high, low)
    }
}

/// Macro to define common address type functionality.
///
/// This macro generates the basic structure and methods common to both physical
/// and virtual address types.
macro_rules! impl_address_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new address.
            #[inline]
            pub const fn new(addr: u32) -> Self {
                Self(addr)
            }

            /// Returns the raw address value.
            #[inline]
            pub const fn as_u32(self) -> u32 {
                self.0
            }

            /// Returns the raw address value widened to `usize`.
            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }

            /// Checks if the address is aligned to the given alignment.
            ///
            /// # Panics
            ///
            /// Panics if `align` is not a power of two.
            #[inline]
            pub const fn is_aligned(self, align: u32) -> bool {
                assert!(align.is_power_of_two(), "alignment must be a power of two");
                self.0 & (align - 1) == 0
            }

            /// Aligns the address down to the given alignment.
            ///
            /// # Panics
            ///
            /// Panics if `align` is not a power of two.
            #[inline]
            pub const fn align_down(self, align: u32) -> Self {
                assert!(align.is_power_of_two(), "alignment must be a power of two");
                Self(self.0 & !(align - 1))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(", stringify!($name))?;
                write_grouped_hex(f, self.0)?;
                write!(f, ")")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_grouped_hex(f, self.0)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(addr: u32) -> Self {
                Self::new(addr)
            }
        }

        impl Add<u32> for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: u32) -> Self::Output {
                Self::new(self.0 + rhs)
            }
        }

        impl Sub<u32> for $name {
            type Output = Self;

            #[inline]
            fn sub(self, rhs: u32) -> Self::Output {
                Self::new(self.0 - rhs)
            }
        }

        impl Sub<$name> for $name {
            type Output = u32;

            #[inline]
            fn sub(self, rhs: $name) -> Self::Output {
                self.0 - rhs.0
            }
        }
    };
}

impl_address_common!(
    PhysicalAddress,
    "A physical memory address.\n\n\
     Page tables, the TTBR and every descriptor frame field hold physical addresses."
);

impl_address_common!(
    VirtualAddress,
    "A virtual memory address.\n\n\
     Virtual addresses select the Level-1 and Level-2 slots a mapping is written to."
);

impl VirtualAddress {
    /// Returns the Level-1 slot that translates this address (one slot per 1 MiB).
    #[inline]
    pub const fn section_index(self) -> usize {
        (self.0 >> SECTION_SHIFT) as usize
    }

    /// Returns the Level-2 slot that translates this address within its coarse table.
    #[inline]
    pub const fn small_page_index(self) -> usize {
        (self.0 >> SMALL_PAGE_SHIFT) as usize & (L2_ENTRY_COUNT - 1)
    }
}
