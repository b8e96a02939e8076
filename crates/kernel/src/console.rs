//! Defines the early debug console that logs to the serial port.

#[cfg(all(debug_assertions, target_arch = "arm"))]
use log::LevelFilter;
use spin::Mutex;
#[cfg(target_arch = "arm")]
use spin::Once;

use crate::serial::SerialWriter;

pub struct Console {
    serial: Mutex<Option<SerialWriter>>,
}

#[cfg(target_arch = "arm")]
static DEFAULT: Once<Console> = Once::new();

#[cfg(target_arch = "arm")]
impl Console {
    pub fn init() -> &'static Self {
        let console = Self::default();
        console.install();
        console
    }

    pub fn default() -> &'static Self {
        DEFAULT.call_once(|| Console {
            serial: Mutex::new(None),
        })
    }

    /// Registers the console as the global logger. Only the first call has an effect.
    pub fn install(&'static self) {
        if log::set_logger(self).is_err() {
            return;
        }

        #[cfg(debug_assertions)]
        log::set_max_level(LevelFilter::Trace);

        #[cfg(not(debug_assertions))]
        log::set_max_level(log::LevelFilter::Info);
    }

    pub fn attach_serial(&self, serial: SerialWriter) {
        let mut guard = self.serial.lock();
        *guard = Some(serial);
    }
}

impl log::Log for Console {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Some(serial) = &mut *self.serial.lock() {
            // Nowhere left to report a failing UART.
            let _ = write_log_entry_to(serial, record);
        }
    }

    fn flush(&self) {}
}

fn write_log_entry_to(writer: &mut impl core::fmt::Write, record: &log::Record) -> core::fmt::Result {
    #[cfg(any(debug_assertions, feature = "detailed-logging"))]
    return writeln!(
        writer,
        "[{} {}:{} {}] {}",
        record.level(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.target(),
        record.args()
    );
    #[cfg(not(any(debug_assertions, feature = "detailed-logging")))]
    return writeln!(writer, "[{:5}] {}", record.level(), record.args());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_log_entry() {
        let mut out = String::new();
        write_log_entry_to(
            &mut out,
            &log::Record::builder()
                .args(format_args!("process {}: removed", 3))
                .level(log::Level::Info)
                .target("omap_mmu::address_space")
                .file(Some("address_space.rs"))
                .line(Some(42))
                .build(),
        )
        .unwrap();

        #[cfg(any(debug_assertions, feature = "detailed-logging"))]
        assert_eq!(out, "[INFO address_space.rs:42 omap_mmu::address_space] process 3: removed\n");
        #[cfg(not(any(debug_assertions, feature = "detailed-logging")))]
        assert_eq!(out, "[INFO ] process 3: removed\n");
    }

    #[test]
    fn console_without_serial_drops_records() {
        let console = Console {
            serial: Mutex::new(None),
        };
        log::Log::log(
            &console,
            &log::Record::builder()
                .args(format_args!("dropped"))
                .level(log::Level::Warn)
                .build(),
        );
        assert!(console.serial.lock().is_none());
    }
}
