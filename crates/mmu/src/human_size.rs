//! Human-readable size formatting for log output.

use core::fmt;

/// Wraps a size in bytes and formats it with binary prefixes.
///
/// Sizes are shown in the largest unit they reach, with at most one decimal
/// place. The kernel formats without floating point, so the decimal is
/// truncated rather than rounded.
///
/// # Examples
///
/// ```
/// use omap_mmu::HumanSize;
///
/// assert_eq!(format!("{}", HumanSize(0)), "0B");
/// assert_eq!(format!("{}", HumanSize(1024)), "1KiB");
/// assert_eq!(format!("{}", HumanSize(1536)), "1.5KiB");
/// assert_eq!(format!("{}", HumanSize(0x0200_0000)), "32MiB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct HumanSize(pub u64);

impl From<u32> for HumanSize {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value as u64)
    }
}

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

        let mut unit = 0;
        while unit + 1 < UNITS.len() && self.0 >> (10 * (unit + 1)) != 0 {
            unit += 1;
        }

        let scale = 1u64 << (10 * unit);
        let whole = self.0 / scale;
        let tenths = (self.0 % scale) * 10 / scale;
        if tenths == 0 {
            write!(f, "{}{}", whole, UNITS[unit])
        } else {
            write!(f, "{}.{}{}", whole, tenths, UNITS[unit])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes() {
        assert_eq!(format!("{}", HumanSize(1)), "1B");
        assert_eq!(format!("{}", HumanSize(1023)), "1023B");
    }

    #[test]
    fn formats_table_sizes() {
        assert_eq!(format!("{}", HumanSize::from(0x400u32)), "1KiB");
        assert_eq!(format!("{}", HumanSize::from(0x4000u32)), "16KiB");
        assert_eq!(format!("{}", HumanSize::from(0x10_0000u32)), "1MiB");
    }

    #[test]
    fn formats_fractions_truncated() {
        assert_eq!(format!("{}", HumanSize(1536)), "1.5KiB");
        assert_eq!(format!("{}", HumanSize(1025)), "1KiB");
        assert_eq!(format!("{}", HumanSize(0x0018_0000)), "1.5MiB");
    }

    #[test]
    fn formats_full_address_space() {
        assert_eq!(format!("{}", HumanSize(1 << 32)), "4GiB");
    }
}
