//! Configuration records shared between the firmware crate and host tests.
//!
//! The firmware loads and persists these through NVS; validation lives here
//! so the bounds can be tested without hardware.

use core::fmt;

use serde::{Deserialize, Serialize};

pub const SSID_MAX_LEN: usize = 32;
pub const PSK_MIN_LEN: usize = 8;
pub const PSK_MAX_LEN: usize = 64;

/// Security mode requested from the Wi-Fi driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthMode {
    Open,
    WpaPsk,
}

/// Immutable network credentials, bound at build/config time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    pub ssid: String,
    pub psk: String,
    /// `None` lets the driver scan all channels.
    pub channel: Option<u8>,
    pub auth: AuthMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    EmptySsid,
    SsidTooLong,
    PskLengthOutOfRange,
    PskSetForOpenNetwork,
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredentialsError::EmptySsid => "Wi-Fi SSID must not be empty",
            CredentialsError::SsidTooLong => "Wi-Fi SSID must be 32 bytes or less",
            CredentialsError::PskLengthOutOfRange => {
                "Wi-Fi passphrase must be between 8 and 64 bytes"
            }
            CredentialsError::PskSetForOpenNetwork => {
                "open networks must not carry a passphrase"
            }
        };
        f.write_str(s)
    }
}

impl std::error::Error for CredentialsError {}

impl Credentials {
    pub fn validate(&self) -> Result<(), CredentialsError> {
        if self.ssid.is_empty() {
            return Err(CredentialsError::EmptySsid);
        }
        if self.ssid.len() > SSID_MAX_LEN {
            return Err(CredentialsError::SsidTooLong);
        }
        match self.auth {
            AuthMode::Open => {
                if !self.psk.is_empty() {
                    return Err(CredentialsError::PskSetForOpenNetwork);
                }
            }
            AuthMode::WpaPsk => {
                if self.psk.len() < PSK_MIN_LEN || self.psk.len() > PSK_MAX_LEN {
                    return Err(CredentialsError::PskLengthOutOfRange);
                }
            }
        }
        Ok(())
    }
}

/// Settings handed to the update client at activation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateSettings {
    pub device_type: String,
    pub recommissioning: bool,
    pub check_interval_secs: u32,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            device_type: "esp32-ota-node".to_string(),
            recommissioning: false,
            check_interval_secs: 30 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wpa(ssid: &str, psk: &str) -> Credentials {
        Credentials {
            ssid: ssid.to_string(),
            psk: psk.to_string(),
            channel: None,
            auth: AuthMode::WpaPsk,
        }
    }

    #[test]
    fn accepts_typical_credentials() {
        assert!(wpa("workshop-iot", "hunter2hunter2").validate().is_ok());
    }

    #[test]
    fn rejects_empty_ssid() {
        assert_eq!(wpa("", "password").validate(), Err(CredentialsError::EmptySsid));
    }

    #[test]
    fn rejects_oversized_ssid() {
        let ssid = "s".repeat(SSID_MAX_LEN + 1);
        assert_eq!(
            wpa(&ssid, "password").validate(),
            Err(CredentialsError::SsidTooLong)
        );
        let ssid = "s".repeat(SSID_MAX_LEN);
        assert!(wpa(&ssid, "password").validate().is_ok());
    }

    #[test]
    fn enforces_psk_bounds() {
        assert_eq!(
            wpa("net", "short").validate(),
            Err(CredentialsError::PskLengthOutOfRange)
        );
        let long = "p".repeat(PSK_MAX_LEN + 1);
        assert_eq!(
            wpa("net", &long).validate(),
            Err(CredentialsError::PskLengthOutOfRange)
        );
        assert!(wpa("net", &"p".repeat(PSK_MIN_LEN)).validate().is_ok());
        assert!(wpa("net", &"p".repeat(PSK_MAX_LEN)).validate().is_ok());
    }

    #[test]
    fn open_network_must_not_have_psk() {
        let mut creds = wpa("cafe", "");
        creds.auth = AuthMode::Open;
        assert!(creds.validate().is_ok());
        creds.psk = "something".to_string();
        assert_eq!(
            creds.validate(),
            Err(CredentialsError::PskSetForOpenNetwork)
        );
    }

    #[test]
    fn credentials_serialization_round_trip() {
        let creds = wpa("workshop-iot", "hunter2hunter2");
        let json = serde_json::to_string(&creds).unwrap();
        let back: Credentials = serde_json::from_str(&json).unwrap();
        assert_eq!(creds, back);
    }

    #[test]
    fn update_settings_defaults() {
        let settings = UpdateSettings::default();
        assert!(!settings.recommissioning);
        assert_eq!(settings.check_interval_secs, 1800);
    }
}
