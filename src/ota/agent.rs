// OTA Agent - one-time provisioning bridge between connectivity and the
// update client

use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{debug, error, info, warn};

use ota_node_core::config::UpdateSettings;
use ota_node_core::identity::HardwareAddress;
use ota_node_core::provision::{classify_install, InstallOutcome};

use crate::network::WifiHandle;
use crate::ota::certs::CredentialStore;
use crate::ota::client::{ClientCallbacks, ClientConfig, UpdateClient};
use crate::system::reset;
use crate::version;

const AGENT_THREAD_STACK_SIZE: usize = 8192;

/// Generous bound on the initial wait for connectivity; on expiry the agent
/// simply re-enters the wait.
const CONNECTIVITY_WAIT: Duration = Duration::from_secs(10);

/// Bound used by the client's network probe.
const PROBE_WAIT: Duration = Duration::from_millis(500);

/// Trust material for the update transport, NUL-terminated for the platform
/// PEM parser. Replace certs/update_ca.pem with your update server's CA.
const PRIMARY_CA: &[u8] = concat!(include_str!("../../certs/update_ca.pem"), "\0").as_bytes();

pub struct UpdateAgent;

impl UpdateAgent {
    /// Spawn the bring-up thread: wait for connectivity, provision once,
    /// activate the update client, then go dormant.
    pub fn spawn(wifi: WifiHandle, settings: UpdateSettings) -> Result<()> {
        thread::Builder::new()
            .name("ota-agent".to_string())
            .stack_size(AGENT_THREAD_STACK_SIZE)
            .spawn(move || run(wifi, settings))?;

        info!("OTA agent initialized");
        Ok(())
    }
}

fn run(wifi: WifiHandle, settings: UpdateSettings) {
    info!("OTA agent thread started");

    loop {
        // Wait for Wi-Fi; re-enter the wait indefinitely until it is up.
        if !wifi.is_connected(CONNECTIVITY_WAIT) {
            continue;
        }

        let identity = wifi.hardware_address();

        let mut store = CredentialStore::new();
        match classify_install(store.install("update-ca-primary", PRIMARY_CA)) {
            InstallOutcome::Installed => info!("TLS credentials added successfully"),
            InstallOutcome::AlreadyPresent => warn!("TLS credentials already exist, continuing"),
            InstallOutcome::Degraded(e) => error!("Failed to add TLS credentials: {}", e),
        }

        if let Err(e) = bring_up_client(&wifi, &settings, identity) {
            error!("Failed to start the update client: {:?}", e);
            error!("Update capability disabled until the next power cycle");
        }

        // Provisioning happens at most once per power cycle; the client owns
        // everything from here. Park for good.
        loop {
            thread::park();
        }
    }
}

fn bring_up_client(
    wifi: &WifiHandle,
    settings: &UpdateSettings,
    identity: HardwareAddress,
) -> Result<()> {
    let config = ClientConfig {
        device_type: settings.device_type.clone(),
        recommissioning: settings.recommissioning,
        check_interval: Duration::from_secs(settings.check_interval_secs as u64),
    };

    info!("Initializing update client with:");
    info!("   Device type: '{}'", config.device_type);
    info!("   Identity:    '{}'", identity);

    let probe = wifi.clone();
    let callbacks = ClientCallbacks {
        network_connect: Box::new(move || probe.is_connected(PROBE_WAIT)),
        network_release: Box::new(|| debug!("Network released by update client")),
        deployment_status: Box::new(|status, desc| {
            info!("Deployment status: {:?} ({})", status, desc)
        }),
        restart: Box::new(|| reset::warm_restart()),
        get_identity: Box::new(move || identity.clone()),
    };

    let mut client = UpdateClient::new(config, callbacks)?;
    client.add_inventory("App", version::APP_NAME)?;
    client.activate()?;

    info!("Update client started");
    Ok(())
}
