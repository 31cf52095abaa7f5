pub mod led;

pub use led::{LedTone, StatusLed};
