// Update client - autonomous firmware-update session once activated
//
// The agent hands over an immutable configuration, lifecycle callbacks and
// the inventory table; from `activate()` on, the session schedules itself:
// poll the release manifest, stream new firmware into the inactive
// partition, ask the host to restart.

use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use embedded_svc::http::client::Client;
use embedded_svc::http::Method;
use embedded_svc::io::Read;
use esp_idf_svc::http::client::{Configuration as HttpConfig, EspHttpConnection};
use esp_idf_svc::ota::EspOta;
use log::{debug, info, warn};
use serde::Deserialize;

use ota_node_core::identity::HardwareAddress;

/// Release manifest location. Replace with your update server.
const VERSION_URL: &str = "https://your-update-server.example/ota-node/version.json";

const CLIENT_THREAD_STACK_SIZE: usize = 8192;
const MAX_INVENTORY_ENTRIES: usize = 4;

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Deserialize)]
struct VersionInfo {
    version: String,
    url: String,
    size: usize,
}

/// Deployment progress reported through the status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    Downloading,
    Installing,
    Rebooting,
    Failure,
}

/// Immutable configuration handed over at activation.
pub struct ClientConfig {
    pub device_type: String,
    pub recommissioning: bool,
    pub check_interval: Duration,
}

/// Lifecycle hooks the session drives. The host wires them once; the client
/// owns them after activation.
pub struct ClientCallbacks {
    /// Probe for network availability before each session.
    pub network_connect: Box<dyn Fn() -> bool + Send>,
    /// Called when the session is done with the network.
    pub network_release: Box<dyn Fn() + Send>,
    /// Deployment progress notifications.
    pub deployment_status: Box<dyn Fn(DeploymentStatus, &str) + Send>,
    /// Restart into the staged firmware. Does not return.
    pub restart: Box<dyn Fn() + Send>,
    /// Device identity reported to the update service.
    pub get_identity: Box<dyn Fn() -> HardwareAddress + Send>,
}

#[derive(Debug, Clone)]
pub struct InventoryEntry {
    pub name: &'static str,
    pub value: String,
}

pub struct UpdateClient {
    config: ClientConfig,
    callbacks: ClientCallbacks,
    inventory: heapless::Vec<InventoryEntry, MAX_INVENTORY_ENTRIES>,
}

impl UpdateClient {
    pub fn new(config: ClientConfig, callbacks: ClientCallbacks) -> Result<Self> {
        if config.device_type.is_empty() {
            bail!("Device type must not be empty");
        }
        Ok(Self {
            config,
            callbacks,
            inventory: heapless::Vec::new(),
        })
    }

    /// Register a persistent inventory record reported with every session.
    pub fn add_inventory(&mut self, name: &'static str, value: &str) -> Result<()> {
        self.inventory
            .push(InventoryEntry {
                name,
                value: value.to_string(),
            })
            .map_err(|_| anyhow!("Inventory table full"))
    }

    /// Detach the session onto its own thread. The client is autonomous
    /// from here on; the host only hears from it through the callbacks.
    pub fn activate(self) -> Result<()> {
        thread::Builder::new()
            .name("update-client".to_string())
            .stack_size(CLIENT_THREAD_STACK_SIZE)
            .spawn(move || self.run_session())?;
        Ok(())
    }

    fn run_session(self) {
        let identity = (self.callbacks.get_identity)();
        info!(
            "Update client active: device type '{}', identity '{}'",
            self.config.device_type, identity
        );
        if self.config.recommissioning {
            info!("Recommissioning requested, identity will be re-registered");
        }
        for entry in &self.inventory {
            debug!("Inventory: {} = {}", entry.name, entry.value);
        }

        loop {
            if (self.callbacks.network_connect)() {
                match self.check_and_apply() {
                    Ok(true) => {
                        (self.callbacks.deployment_status)(
                            DeploymentStatus::Rebooting,
                            "restarting into staged firmware",
                        );
                        (self.callbacks.network_release)();
                        (self.callbacks.restart)();
                    }
                    Ok(false) => {}
                    Err(e) => {
                        (self.callbacks.deployment_status)(DeploymentStatus::Failure, "check failed");
                        warn!("Update check failed: {:?}", e);
                    }
                }
                (self.callbacks.network_release)();
            } else {
                warn!("Network unavailable, skipping update check");
            }

            thread::sleep(self.config.check_interval);
        }
    }

    /// Poll the manifest; stage new firmware when the version differs.
    /// Returns `true` when a restart is required.
    fn check_and_apply(&self) -> Result<bool> {
        let version_info = self.fetch_version_info()?;

        if version_info.version == CURRENT_VERSION {
            debug!("Already running latest version: {}", CURRENT_VERSION);
            return Ok(false);
        }

        info!(
            "New release available: {} (current: {})",
            version_info.version, CURRENT_VERSION
        );
        (self.callbacks.deployment_status)(DeploymentStatus::Downloading, &version_info.version);
        self.perform_update(&version_info)?;
        Ok(true)
    }

    fn fetch_version_info(&self) -> Result<VersionInfo> {
        let config = HttpConfig {
            buffer_size: Some(4096),
            timeout: Some(Duration::from_secs(30)),
            use_global_ca_store: true,
            ..Default::default()
        };

        let mut client = Client::wrap(EspHttpConnection::new(&config)?);
        let request = client.request(Method::Get, VERSION_URL, &[])?;
        let mut response = request.submit()?;

        if response.status() != 200 {
            bail!("Failed to fetch version info: HTTP {}", response.status());
        }

        let mut body = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let bytes_read = response.read(&mut buf)?;
            if bytes_read == 0 {
                break;
            }
            body.extend_from_slice(&buf[..bytes_read]);
        }

        let version_info: VersionInfo = serde_json::from_slice(&body)?;
        Ok(version_info)
    }

    fn perform_update(&self, version_info: &VersionInfo) -> Result<()> {
        info!("Starting firmware update...");

        let mut ota = EspOta::new()?;
        let mut ota_update = ota.initiate_update()?;

        let config = HttpConfig {
            buffer_size: Some(4096),
            timeout: Some(Duration::from_secs(60)),
            use_global_ca_store: true,
            ..Default::default()
        };

        let mut client = Client::wrap(EspHttpConnection::new(&config)?);
        let request = client.request(Method::Get, &version_info.url, &[])?;
        let mut response = request.submit()?;

        if response.status() != 200 {
            bail!("Failed to download firmware: HTTP {}", response.status());
        }

        let mut total_bytes = 0;
        let mut buf = [0u8; 4096];

        loop {
            let bytes_read = response.read(&mut buf)?;
            if bytes_read == 0 {
                break;
            }

            ota_update.write(&buf[..bytes_read])?;
            total_bytes += bytes_read;

            if version_info.size > 0 {
                let progress = (total_bytes * 100) / version_info.size;
                debug!(
                    "Update progress: {}% ({}/{})",
                    progress, total_bytes, version_info.size
                );
            }
        }

        (self.callbacks.deployment_status)(DeploymentStatus::Installing, &version_info.version);
        ota_update.complete()?;

        info!("Firmware staged into the inactive partition");
        Ok(())
    }
}
