// TLS trust store - CA certificates for the update transport

use esp_idf_sys::{ESP_ERR_INVALID_STATE, ESP_ERR_NO_MEM, ESP_OK};
use log::debug;

use ota_node_core::provision::CredError;

/// Facade over the platform's global CA store. Installs are keyed by a
/// caller-chosen tag so a repeated install of the same material reports
/// `AlreadyExists` instead of clobbering the store.
pub struct CredentialStore {
    installed: Vec<&'static str>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            installed: Vec::new(),
        }
    }

    /// Install a PEM bundle under `tag`. The buffer must be NUL-terminated,
    /// as the platform parser requires for PEM input.
    pub fn install(&mut self, tag: &'static str, pem: &[u8]) -> Result<(), CredError> {
        if self.installed.contains(&tag) {
            return Err(CredError::AlreadyExists);
        }

        let err = unsafe { esp_idf_sys::esp_tls_set_global_ca_store(pem.as_ptr(), pem.len() as u32) };
        match err {
            e if e == ESP_OK => {
                debug!("CA bundle '{}' installed ({} bytes)", tag, pem.len());
                self.installed.push(tag);
                Ok(())
            }
            e if e == ESP_ERR_NO_MEM as i32 => Err(CredError::OutOfMemory),
            e if e == ESP_ERR_INVALID_STATE as i32 => Err(CredError::AlreadyExists),
            _ => Err(CredError::AccessDenied),
        }
    }
}
