#![cfg_attr(not(any(test, feature = "software-emulation")), no_std)]

//! # OMAP3530 MMU configuration
//!
//! Builds the ARMv7 short-descriptor translation tables for a small kernel on
//! the OMAP3530 and programs the CP15 registers that turn translation on. It
//! provides:
//!
//! - Encoding of section, coarse-table and small-page descriptors.
//! - The kernel's fixed identity-mapped address space.
//! - Per-process address spaces in fixed table slots.
//! - Software emulation of table memory and registers for host testing.

#[cfg(any(test, feature = "software-emulation"))]
extern crate alloc;

mod address;
mod address_space;
pub mod arch;
mod config;
mod descriptor;
pub mod encoder;
mod error;
mod human_size;
mod kernel_space;
pub mod layout;
mod memory;
mod mmu;
mod region;
mod registers;
mod table;

pub use address::{PhysicalAddress, VirtualAddress};
pub use address_space::{ProcessAddressSpace, ProcessId, ProcessSlots, add_process, pages_for, remove_process};
pub use config::MmuConfig;
pub use descriptor::{Descriptor, DescriptorKind};
pub use encoder::{write_section, write_small_pages, write_table};
pub use error::{AddressKind, MmuError};
pub use human_size::HumanSize;
pub use kernel_space::{build_kernel_space, kernel_regions};
pub use memory::{DirectMemory, TableMemory};
pub use mmu::Mmu;
pub use region::{AccessPermission, CachePolicy, PageSize, Region};
pub use registers::{DomainAccess, DomainAccessControl, MmuRegisters, translation_table_base};
pub use table::{CoarseTable, Domain, MasterTable, TableRef};
