use anyhow::Result;
use esp_idf_hal::gpio::{AnyIOPin, IOPin, Pin};
use esp_idf_hal::prelude::*;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_sys as _; // Binstart
use log::{error, info};

// Generate ESP-IDF app descriptor
#[allow(unexpected_cfgs)]
mod app_desc {
    esp_idf_sys::esp_app_desc!();
}

mod config;
mod hardware;
mod logging;
mod network;
mod ota;
mod power;
mod system;
mod ui;
mod version;

use crate::hardware::ButtonListener;
use crate::network::WifiAgent;
use crate::ota::UpdateAgent;
use crate::power::PowerController;
use crate::system::fatal;
use crate::ui::{LedTone, StatusLed};

fn main() -> Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();

    logging::init_logger().expect("Failed to initialize logger");

    info!("{} running", version::full_version());
    info!("Boot reason: {}", system::reset::get_reset_reason());
    if system::reset::woke_from_deep_sleep() {
        info!("Woken from deep sleep by the button");
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let config = config::load_or_default(nvs.clone());
    if let Err(e) = config.wifi.validate() {
        error!("Invalid Wi-Fi credentials: {}", e);
        fatal::halt("configuration defect");
    }

    let mut led = StatusLed::new(peripherals.rmt.channel0, peripherals.pins.gpio48)?;
    led.set(LedTone::Off);

    // Connectivity agent: state machine loop plus driver event subscription
    let wifi = WifiAgent::new(peripherals.modem, sysloop, nvs, &config.wifi)?.start()?;

    // Update agent: waits for connectivity, provisions, hands off to the
    // update client
    UpdateAgent::spawn(wifi.clone(), config.update.clone())?;

    // Button and debounce; failures here are hardware defects and fatal
    let button_pin: AnyIOPin = peripherals.pins.gpio0.downgrade();
    let wake_pin = button_pin.pin();
    let buttons = match ButtonListener::start(button_pin) {
        Ok(listener) => listener,
        Err(e) => {
            error!("Error: button device is not ready: {:?}", e);
            fatal::halt("button bring-up failed");
        }
    };

    PowerController::new(buttons, wifi, led, wake_pin).run()
}
