/// Last-resort handling for unrecoverable hardware and configuration
/// defects.
use esp_idf_hal::delay::FreeRtos;
use log::error;

/// Log the defect and park the calling thread forever.
///
/// Used when startup hits a condition that cannot be corrected at runtime
/// (button device not ready, pin or interrupt configuration failure). The
/// rest of the system keeps whatever service it already has; this thread is
/// done.
pub fn halt(context: &str) -> ! {
    error!("FATAL: {} - parking thread, power cycle required", context);
    log::logger().flush();

    loop {
        FreeRtos::delay_ms(60_000);
    }
}
