//! Architecture-specific implementations of the register and memory seams.
//!
//! This module conditionally imports either the ARMv7 hardware implementation
//! or software emulation based on the target architecture and features.

// Use the CP15 implementation when building for a 32-bit ARM target.
#[cfg(target_arch = "arm")]
mod armv7;
#[cfg(target_arch = "arm")]
pub use armv7::*;

// Use software emulation ONLY when:
// - Running tests, OR
// - software-emulation feature is explicitly enabled
#[cfg(any(test, feature = "software-emulation"))]
mod software;
#[cfg(any(test, feature = "software-emulation"))]
pub use software::*;
