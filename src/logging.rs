use log::{Level, LevelFilter, Metadata, Record};
use std::sync::OnceLock;
use std::time::SystemTime;

static BOOT_TIME: OnceLock<SystemTime> = OnceLock::new();

mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BRIGHT_RED: &str = "\x1b[91m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_BLUE: &str = "\x1b[94m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Logger that prints colored, boot-relative timestamped lines to the
/// console UART.
struct NodeLogger;

impl log::Log for NodeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Time since boot
        let boot_time = BOOT_TIME.get_or_init(SystemTime::now);
        let elapsed = SystemTime::now()
            .duration_since(*boot_time)
            .unwrap_or_default();
        let seconds = elapsed.as_secs();
        let millis = elapsed.subsec_millis();

        let (color, level_str) = match record.level() {
            Level::Error => (colors::BRIGHT_RED, "ERROR"),
            Level::Warn => (colors::BRIGHT_YELLOW, "WARN "),
            Level::Info => (colors::BRIGHT_GREEN, "INFO "),
            Level::Debug => (colors::BRIGHT_BLUE, "DEBUG"),
            Level::Trace => (colors::GRAY, "TRACE"),
        };

        let module = record
            .module_path()
            .unwrap_or("?")
            .trim_start_matches("esp32_ota_node::");

        println!(
            "{}{:>4}.{:03}s {} [{}] {}{}",
            color,
            seconds,
            millis,
            level_str,
            module,
            record.args(),
            colors::RESET
        );
    }

    fn flush(&self) {}
}

static LOGGER: NodeLogger = NodeLogger;

pub fn init_logger() -> Result<(), log::SetLoggerError> {
    BOOT_TIME.get_or_init(SystemTime::now);
    log::set_logger(&LOGGER)?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}
