//! ARMv7-A (Cortex-A8) hardware implementation.
//!
//! CP15 accesses follow the short-descriptor VMSA. The SDRAM size is programmed
//! into the OMAP3530 SDRC, which is the only board-specific register here.

mod registers;

pub use registers::Cp15Registers;
