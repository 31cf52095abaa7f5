use std::fs;
use std::path::Path;

// Credentials live in wifi_config.h (gitignored) and are injected into the
// build as environment variables consumed by config.rs.
const WIFI_CONFIG: &str = "wifi_config.h";

fn define_value<'a>(contents: &'a str, name: &str) -> Option<&'a str> {
    contents
        .lines()
        .find(|l| l.contains(&format!("#define {}", name)))
        .and_then(|l| l.split('"').nth(1))
}

fn main() -> anyhow::Result<()> {
    // Necessary for ESP-IDF
    embuild::espidf::sysenv::output();

    if Path::new(WIFI_CONFIG).exists() {
        let contents = fs::read_to_string(WIFI_CONFIG)?;
        let ssid = define_value(&contents, "WIFI_SSID").unwrap_or("");
        let pass = define_value(&contents, "WIFI_PASSWORD").unwrap_or("");
        println!("cargo:rustc-env=WIFI_SSID={}", ssid);
        println!("cargo:rustc-env=WIFI_PASSWORD={}", pass);
    } else {
        println!("cargo:rustc-env=WIFI_SSID=");
        println!("cargo:rustc-env=WIFI_PASSWORD=");
        println!(
            "cargo:warning={} not found! Copy wifi_config.h.example to {} and add your credentials.",
            WIFI_CONFIG, WIFI_CONFIG
        );
    }

    println!("cargo:rerun-if-changed={}", WIFI_CONFIG);

    Ok(())
}
