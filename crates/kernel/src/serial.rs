//! Polled output on the OMAP3530 UART3, the console port on the Beagle board.

use core::{fmt, hint};

#[cfg(target_arch = "arm")]
use crate::console::Console;

// cSpell:ignore uart
/// Physical base of UART3. Inside the identity-mapped peripheral window, so the
/// address stays valid after translation is turned on.
#[cfg(target_arch = "arm")]
pub const UART3_BASE: usize = 0x4902_0000;

/// Transmit holding register.
const THR: usize = 0x00;
/// Line status register. Registers are 8 bits wide on a 4-byte stride.
const LSR: usize = 0x14;
const LSR_THRE: u8 = 1 << 5;

pub struct SerialWriter {
    base: usize,
}

impl SerialWriter {
    /// # Safety
    /// `base` must be the address of a UART already configured by the boot
    /// loader, and no other code may drive it.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn write_byte(&mut self, byte: u8) {
        let lsr = (self.base + LSR) as *const u8;
        let thr = (self.base + THR) as *mut u8;
        // SAFETY: The constructor guarantees these are the UART's registers.
        unsafe {
            while lsr.read_volatile() & LSR_THRE == 0 {
                hint::spin_loop();
            }
            thr.write_volatile(byte);
        }
    }
}

impl fmt::Write for SerialWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}

#[cfg(target_arch = "arm")]
pub fn init(console: &Console) {
    // SAFETY: The boot loader leaves UART3 configured and the console is its only user.
    let port = unsafe { SerialWriter::new(UART3_BASE) };
    console.attach_serial(port);
}

#[cfg(test)]
mod tests {
    use core::fmt::Write;

    use super::*;

    #[test]
    fn translates_newlines() {
        // Fake register block: LSR reports an empty holding register, THR keeps the last byte.
        let mut registers = [0u8; 0x18];
        registers[LSR] = LSR_THRE;
        let base = registers.as_mut_ptr() as usize;

        // SAFETY: `base` points at `registers`, which outlives the writer.
        let mut serial = unsafe { SerialWriter::new(base) };
        serial.write_str("ok\n").unwrap();
        assert_eq!(registers[THR], b'\n');
        assert_eq!(registers[LSR], LSR_THRE);
    }
}
