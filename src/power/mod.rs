// Power Controller - button-driven connect/sleep alternation and the
// terminal transition into deep sleep

use esp_idf_hal::delay::FreeRtos;
use log::info;

use ota_node_core::power::{PressAction, SLEEP_SETTLE_MS};

use crate::hardware::ButtonListener;
use crate::network::WifiHandle;
use crate::ui::{LedTone, StatusLed};

pub struct PowerController {
    buttons: ButtonListener,
    wifi: WifiHandle,
    led: StatusLed,
    wake_pin: i32,
}

impl PowerController {
    pub fn new(buttons: ButtonListener, wifi: WifiHandle, led: StatusLed, wake_pin: i32) -> Self {
        Self {
            buttons,
            wifi,
            led,
            wake_pin,
        }
    }

    /// Main loop. Never returns: every second press ends in deep sleep,
    /// which only exits through a full power-on reset.
    pub fn run(mut self) -> ! {
        self.led.set(LedTone::Off);
        let mut action = PressAction::FIRST;

        loop {
            self.buttons.wait_press();
            match action {
                PressAction::Connect => {
                    info!("Button pressed, connecting to Wi-Fi...");
                    if self.wifi.connect() {
                        self.led.set(LedTone::Blue);
                    }
                }
                PressAction::Sleep => {
                    info!("Button pressed again, putting device to sleep...");
                    self.wifi.disconnect();
                    FreeRtos::delay_ms(SLEEP_SETTLE_MS);
                    self.led.set(LedTone::Off);
                    self.enter_deep_sleep();
                }
            }
            action = action.next();
        }
    }

    fn enter_deep_sleep(&mut self) -> ! {
        info!("Preparing for deep sleep");

        unsafe {
            // Wake on the button's active (low) level
            esp_idf_sys::esp_sleep_enable_ext0_wakeup(self.wake_pin, 0);
        }

        info!("Entering deep sleep NOW");
        log::logger().flush();

        unsafe { esp_idf_sys::esp_deep_sleep_start() }
    }
}
