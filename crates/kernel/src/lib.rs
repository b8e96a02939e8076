// cSpell:ignore kmain

#![cfg_attr(not(test), no_std)]

#[cfg(target_arch = "arm")]
mod arch;
#[cfg(any(test, target_arch = "arm"))]
mod console;
mod mem;
#[cfg(any(test, target_arch = "arm"))]
mod serial;

pub use mem::MmuService;

/// Brings up logging and the MMU, then idles.
///
/// Called once by the boot stub on the boot core, in privileged mode, with
/// translation off.
#[cfg(target_arch = "arm")]
pub fn kernel_main() -> ! {
    let console = console::Console::init();
    serial::init(console);
    log::info!("omap_kernel {}", env!("CARGO_PKG_VERSION"));

    match mem::init() {
        Ok(mmu) => {
            let processes = mmu.with(|mmu| mmu.processes().len());
            log::debug!("MMU service up, {} processes", processes);
        }
        Err(err) => log::error!("MMU bring-up failed: {}", err),
    }

    arch::park();
}

#[cfg(all(target_arch = "arm", not(test)))]
#[unsafe(no_mangle)]
pub extern "C" fn kmain() -> ! {
    kernel_main()
}

#[cfg(all(not(test), target_arch = "arm", target_os = "none"))]
#[panic_handler]
fn rust_panic(info: &core::panic::PanicInfo) -> ! {
    log::error!("kernel panic: {}", info);
    arch::park()
}
