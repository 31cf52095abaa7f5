// Centralized version information

// Cargo package version from Cargo.toml
pub const CARGO_VERSION: &str = env!("CARGO_PKG_VERSION");

// Application name reported in logs and the update inventory
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

// Full version string for boot logging
pub fn full_version() -> String {
    format!("{} v{}", APP_NAME, CARGO_VERSION)
}
