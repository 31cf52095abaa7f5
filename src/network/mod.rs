pub mod wifi;

pub use wifi::{WifiAgent, WifiHandle};
