use core::fmt;

use crate::{PhysicalAddress, VirtualAddress};

/// Which side of a mapping an alignment error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Virtual,
    Physical,
}

/// Errors reported by the MMU configuration layer.
///
/// None of these are recoverable for the address space they concern: a caller
/// that receives one must not activate or schedule onto that address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmuError {
    /// A process needs more pages than a single coarse table can map.
    CapacityExceeded { requested: usize, limit: usize },
    /// An address is not aligned to the granule it is mapped with.
    Misaligned {
        kind: AddressKind,
        address: u32,
        alignment: u32,
    },
    /// The mapping runs past the last slot of its owning table.
    OutOfTableBounds { first_slot: usize, count: usize, slots: usize },
    /// A small-page mapping falls outside its coarse table's 1 MiB window.
    OutsideTableWindow(VirtualAddress),
    /// A mapping of zero pages was requested.
    EmptyRegion,
    /// The region's owning table is the wrong level for the operation.
    WrongTableKind,
    /// The region's page size does not match the operation.
    PageSizeMismatch,
    /// Domain identifiers are limited to 0..=15.
    InvalidDomain(u8),
    /// The process id does not index a process slot.
    InvalidProcess(usize),
    /// The process slot is already allocated.
    SlotInUse(usize),
    /// The process slot is not allocated.
    SlotFree(usize),
    /// A table word lies outside the memory backing the tables.
    OutOfMemoryBounds(PhysicalAddress),
    /// The configuration cannot be programmed into the hardware.
    InvalidConfig(&'static str),
    /// The kernel address space has not been built yet.
    NotInitialized,
    /// The kernel address space was already built and activated.
    AlreadyInitialized,
}

impl MmuError {
    pub(crate) fn misaligned_virtual(address: VirtualAddress, alignment: u32) -> Self {
        Self::Misaligned {
            kind: AddressKind::Virtual,
            address: address.as_u32(),
            alignment,
        }
    }

    pub(crate) fn misaligned_physical(address: PhysicalAddress, alignment: u32) -> Self {
        Self::Misaligned {
            kind: AddressKind::Physical,
            address: address.as_u32(),
            alignment,
        }
    }
}

impl fmt::Display for MmuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { requested, limit } => write!(
                f,
                "process needs {} pages but one coarse table maps at most {}",
                requested, limit
            ),
            Self::Misaligned {
                kind,
                address,
                alignment,
            } => write!(
                f,
                "{:?} address {:#010x} is not aligned to {:#x}",
                kind, address, alignment
            ),
            Self::OutOfTableBounds {
                first_slot,
                count,
                slots,
            } => write!(
                f,
                "{} entries starting at slot {} overrun a table of {} slots",
                count, first_slot, slots
            ),
            Self::OutsideTableWindow(addr) => {
                write!(f, "{} is outside the coarse table's window", addr)
            }
            Self::EmptyRegion => write!(f, "region maps zero pages"),
            Self::WrongTableKind => write!(f, "region is owned by the wrong table level"),
            Self::PageSizeMismatch => write!(f, "region page size does not match the table"),
            Self::InvalidDomain(domain) => write!(f, "domain {} is out of range", domain),
            Self::InvalidProcess(id) => write!(f, "process id {} has no slot", id),
            Self::SlotInUse(id) => write!(f, "process slot {} is already in use", id),
            Self::SlotFree(id) => write!(f, "process slot {} is not allocated", id),
            Self::OutOfMemoryBounds(addr) => {
                write!(f, "table word at {} is outside table memory", addr)
            }
            Self::InvalidConfig(reason) => write!(f, "invalid MMU configuration: {}", reason),
            Self::NotInitialized => write!(f, "kernel address space is not initialized"),
            Self::AlreadyInitialized => write!(f, "kernel address space is already initialized"),
        }
    }
}

impl core::error::Error for MmuError {}
