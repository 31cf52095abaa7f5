// Status LED - WS2812 strip driven over the RMT peripheral

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::rmt::config::TransmitConfig;
use esp_idf_hal::rmt::{PinState, Pulse, RmtChannel, TxRmtDriver, VariableLengthSignal};
use log::warn;

/// Number of pixels on the strip; all show the same tone.
const STRIP_NUM_PIXELS: usize = 1;

/// Discrete indicator tones, rendered as solid colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedTone {
    Off,
    On,
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Magenta,
}

impl LedTone {
    fn rgb(self) -> (u8, u8, u8) {
        match self {
            LedTone::Off => (0x00, 0x00, 0x00),
            LedTone::On => (0xFF, 0xFF, 0xFF),
            LedTone::Red => (0xFF, 0x00, 0x00),
            LedTone::Orange => (0xFF, 0xA5, 0x00),
            LedTone::Yellow => (0xFF, 0xFF, 0x00),
            LedTone::Green => (0x00, 0xFF, 0x00),
            LedTone::Cyan => (0x00, 0xFF, 0xFF),
            LedTone::Blue => (0x00, 0x00, 0xFF),
            LedTone::Purple => (0x80, 0x00, 0x80),
            LedTone::Magenta => (0xFF, 0x00, 0xFF),
        }
    }
}

pub struct StatusLed {
    tx: TxRmtDriver<'static>,
}

impl StatusLed {
    pub fn new(
        channel: impl Peripheral<P = impl RmtChannel> + 'static,
        pin: impl Peripheral<P = impl OutputPin> + 'static,
    ) -> Result<Self> {
        let config = TransmitConfig::new().clock_divider(1);
        let tx = TxRmtDriver::new(channel, pin, &config)?;
        Ok(Self { tx })
    }

    /// Show a tone on the whole strip. Rendering failures are logged and
    /// swallowed; the indicator is never allowed to take the device down.
    pub fn set(&mut self, tone: LedTone) {
        if let Err(e) = self.render(tone) {
            warn!("Failed to update status LED: {:?}", e);
        }
    }

    fn render(&mut self, tone: LedTone) -> Result<()> {
        let (r, g, b) = tone.rgb();
        // WS2812 shifts green first
        let grb: u32 = ((g as u32) << 16) | ((r as u32) << 8) | b as u32;

        let ticks_hz = self.tx.counter_clock()?;
        let t0h = Pulse::new_with_duration(ticks_hz, PinState::High, &Duration::from_nanos(350))?;
        let t0l = Pulse::new_with_duration(ticks_hz, PinState::Low, &Duration::from_nanos(800))?;
        let t1h = Pulse::new_with_duration(ticks_hz, PinState::High, &Duration::from_nanos(700))?;
        let t1l = Pulse::new_with_duration(ticks_hz, PinState::Low, &Duration::from_nanos(600))?;

        let mut signal = VariableLengthSignal::new();
        for _ in 0..STRIP_NUM_PIXELS {
            for i in (0..24).rev() {
                if grb & (1 << i) != 0 {
                    signal.push([&t1h, &t1l])?;
                } else {
                    signal.push([&t0h, &t0l])?;
                }
            }
        }

        self.tx.start_blocking(&signal)?;
        Ok(())
    }
}
