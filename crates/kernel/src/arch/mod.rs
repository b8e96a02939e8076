/// Stops the boot core for good.
pub fn park() -> ! {
    loop {
        // SAFETY: `wfi` only waits for an interrupt.
        unsafe {
            core::arch::asm!("wfi", options(nomem, nostack, preserves_flags));
        }
    }
}
