use anyhow::{anyhow, Result};
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use ota_node_core::config::{AuthMode, Credentials, UpdateSettings};

const CONFIG_NAMESPACE: &str = "ota-node";
const CONFIG_KEY: &str = "config";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub wifi: Credentials,
    pub update: UpdateSettings,
}

impl Default for Config {
    fn default() -> Self {
        // WiFi credentials come from environment variables set by build.rs,
        // which reads wifi_config.h (not committed to git)
        let wifi_ssid = env!("WIFI_SSID");
        let wifi_password = env!("WIFI_PASSWORD");

        let auth = if wifi_password.is_empty() {
            warn!("WiFi passphrase is empty, assuming an open network");
            AuthMode::Open
        } else {
            AuthMode::WpaPsk
        };

        Self {
            wifi: Credentials {
                ssid: wifi_ssid.to_string(),
                psk: wifi_password.to_string(),
                channel: None,
                auth,
            },
            update: UpdateSettings::default(),
        }
    }
}

pub fn load_or_default(nvs: EspDefaultNvsPartition) -> Config {
    match load_from_nvs(nvs) {
        Ok(mut config) => {
            info!("Loaded configuration from NVS");

            // If NVS has empty WiFi credentials, use the compiled-in ones
            if config.wifi.ssid.is_empty() {
                let defaults = Config::default();
                config.wifi = defaults.wifi;
                info!("NVS config has no credentials, using compiled-in ones");
            }

            config
        }
        Err(e) => {
            info!("Using default configuration ({})", e);
            Config::default()
        }
    }
}

fn load_from_nvs(nvs: EspDefaultNvsPartition) -> Result<Config> {
    let nvs = EspNvs::new(nvs, CONFIG_NAMESPACE, true)?;
    let mut buf = [0u8; 512];
    let json = nvs
        .get_str(CONFIG_KEY, &mut buf)?
        .ok_or_else(|| anyhow!("no stored configuration"))?;
    Ok(serde_json::from_str(json)?)
}
