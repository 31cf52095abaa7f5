// Wi-Fi Agent - owns the connectivity state machine and the network driver

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
use log::{debug, error, info, warn};

use ota_node_core::config::{AuthMode, Credentials};
use ota_node_core::identity::{format_mac, HardwareAddress};
use ota_node_core::link::{
    may_disconnect, request_connect, run_connect_attempts, ConnectDecision, LinkEvent, LinkState,
    CONNECTED_POLL_INTERVAL_MS, CONNECT_ATTEMPTS,
};

const AGENT_THREAD_STACK_SIZE: usize = 4096;

/// Asynchronous result events delivered by the driver. `StaConnected` maps
/// to the connect-result, `StaDisconnected` to the disconnect-result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverResult {
    ConnectResult,
    DisconnectResult,
}

/// Sender half of the result channel, reachable from the C event handler.
static RESULT_SIGNAL: OnceLock<Mutex<Sender<DriverResult>>> = OnceLock::new();

unsafe extern "C" fn wifi_result_handler(
    _handler_arg: *mut core::ffi::c_void,
    event_base: *const u8,
    event_id: i32,
    _event_data: *mut core::ffi::c_void,
) {
    use esp_idf_sys::*;

    if event_base != WIFI_EVENT {
        return;
    }

    let result = match event_id as u32 {
        wifi_event_t_WIFI_EVENT_STA_CONNECTED => DriverResult::ConnectResult,
        wifi_event_t_WIFI_EVENT_STA_DISCONNECTED => DriverResult::DisconnectResult,
        _ => return,
    };

    if let Some(signal) = RESULT_SIGNAL.get() {
        if let Ok(tx) = signal.lock() {
            let _ = tx.send(result);
        }
    }
}

/// The connectivity agent. Owns the driver and the `LinkState`; the state is
/// written only by the control loop spawned in [`WifiAgent::start`].
pub struct WifiAgent {
    wifi: Arc<Mutex<EspWifi<'static>>>,
    state: Arc<Mutex<LinkState>>,
    connect_tx: Sender<()>,
    connect_rx: Receiver<()>,
    result_rx: Receiver<DriverResult>,
}

impl WifiAgent {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        credentials: &Credentials,
    ) -> Result<Self> {
        info!("Initializing Wi-Fi agent for SSID '{}'", credentials.ssid);

        let mut wifi = EspWifi::new(modem, sysloop, Some(nvs))?;

        let config = Configuration::Client(ClientConfiguration {
            ssid: credentials
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("Invalid SSID format: {}", credentials.ssid))?,
            password: credentials
                .psk
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("Invalid passphrase format"))?,
            auth_method: match credentials.auth {
                AuthMode::Open => AuthMethod::None,
                AuthMode::WpaPsk => AuthMethod::WPA2Personal,
            },
            channel: credentials.channel,
            ..Default::default()
        });
        wifi.set_configuration(&config)?;

        let (connect_tx, connect_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        if RESULT_SIGNAL.set(Mutex::new(result_tx)).is_err() {
            bail!("Wi-Fi agent already initialized");
        }

        Ok(Self {
            wifi: Arc::new(Mutex::new(wifi)),
            state: Arc::new(Mutex::new(LinkState::Idle)),
            connect_tx,
            connect_rx,
            result_rx,
        })
    }

    /// Register for driver result events, start the driver and spawn the
    /// control loop. Consumes the agent; the returned handle is the only way
    /// to talk to it afterwards.
    pub fn start(self) -> Result<WifiHandle> {
        let Self {
            wifi,
            state,
            connect_tx,
            connect_rx,
            result_rx,
        } = self;

        unsafe {
            use esp_idf_sys::*;
            let err = esp_event_handler_register(
                WIFI_EVENT,
                ESP_EVENT_ANY_ID,
                Some(wifi_result_handler),
                core::ptr::null_mut(),
            );
            if err != ESP_OK {
                bail!("Failed to register Wi-Fi event handler: {}", err);
            }
        }

        wifi.lock()
            .map_err(|_| anyhow!("Wi-Fi driver mutex poisoned"))?
            .start()?;

        let handle = WifiHandle {
            wifi: wifi.clone(),
            state: state.clone(),
            connect_tx: connect_tx.clone(),
        };

        thread::Builder::new()
            .name("wifi-agent".to_string())
            .stack_size(AGENT_THREAD_STACK_SIZE)
            .spawn(move || control_loop(wifi, state, connect_rx, result_rx))?;

        info!("Wi-Fi agent initialized");
        Ok(handle)
    }
}

/// Cheap, cloneable query/request surface of the agent. Reads the published
/// state; never mutates it.
#[derive(Clone)]
pub struct WifiHandle {
    wifi: Arc<Mutex<EspWifi<'static>>>,
    state: Arc<Mutex<LinkState>>,
    connect_tx: Sender<()>,
}

impl WifiHandle {
    fn state(&self) -> LinkState {
        self.state.lock().map(|s| *s).unwrap_or(LinkState::Idle)
    }

    /// Request a connection. Non-blocking: success means the control loop
    /// took the request (or the link was already up), not that the link is
    /// up yet.
    pub fn connect(&self) -> bool {
        match request_connect(self.state()) {
            ConnectDecision::AlreadyConnected => {
                info!("Wi-Fi agent is already connected");
                true
            }
            ConnectDecision::Busy => {
                warn!("Wi-Fi agent is not idle, cannot connect");
                false
            }
            ConnectDecision::Begin => self.connect_tx.send(()).is_ok(),
        }
    }

    /// Request a disconnect. Only valid while connected; the driver request
    /// is issued from the calling thread while the control loop sits parked
    /// waiting for the disconnect result.
    pub fn disconnect(&self) -> bool {
        if !may_disconnect(self.state()) {
            warn!("Wi-Fi agent is not connected, cannot disconnect");
            return false;
        }

        let mut driver = match self.wifi.lock() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        if let Err(e) = driver.disconnect() {
            error!("Failed to initiate Wi-Fi disconnection: {}", e);
            return false;
        }
        true
    }

    /// Bounded wait for connectivity: polls the published state every 100 ms
    /// until connected or the timeout elapses, and returns the final answer.
    pub fn is_connected(&self, timeout: Duration) -> bool {
        let mut remaining_ms = timeout.as_millis() as u64;
        loop {
            if self.state() == LinkState::Connected {
                return true;
            }
            if remaining_ms == 0 {
                return false;
            }
            FreeRtos::delay_ms(CONNECTED_POLL_INTERVAL_MS);
            remaining_ms = remaining_ms.saturating_sub(CONNECTED_POLL_INTERVAL_MS as u64);
        }
    }

    /// Canonical colon-separated MAC of the station interface.
    ///
    /// Only legal after connectivity has been confirmed; calling it earlier
    /// is an ordering bug in the caller, not a runtime condition, and trips
    /// the assertion.
    pub fn hardware_address(&self) -> HardwareAddress {
        let wifi = self.wifi.lock().expect("Wi-Fi driver mutex poisoned");
        assert!(
            wifi.is_up().unwrap_or(false),
            "hardware address requested with no interface up"
        );
        let mac = wifi
            .sta_netif()
            .get_mac()
            .expect("failed to read station MAC address");
        format_mac(&mac)
    }
}

fn set_state(state: &Arc<Mutex<LinkState>>, next: LinkState) {
    if let Ok(mut guard) = state.lock() {
        debug!("Link state: {} -> {}", *guard, next);
        *guard = next;
    }
}

fn read_state(state: &Arc<Mutex<LinkState>>) -> LinkState {
    state.lock().map(|s| *s).unwrap_or(LinkState::Idle)
}

fn issue_connect(wifi: &Arc<Mutex<EspWifi<'static>>>, try_no: u8) -> Result<(), ()> {
    let mut driver = match wifi.lock() {
        Ok(guard) => guard,
        Err(_) => return Err(()),
    };
    match driver.connect() {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(
                "Connect request rejected (attempt {}/{}): {}",
                try_no, CONNECT_ATTEMPTS, e
            );
            Err(())
        }
    }
}

fn control_loop(
    wifi: Arc<Mutex<EspWifi<'static>>>,
    state: Arc<Mutex<LinkState>>,
    connect_rx: Receiver<()>,
    result_rx: Receiver<DriverResult>,
) {
    info!("Wi-Fi agent control loop started");

    loop {
        match read_state(&state) {
            LinkState::Idle => {
                // Wait for a connection request
                if connect_rx.recv().is_err() {
                    break;
                }
                set_state(&state, LinkState::Idle.on_event(LinkEvent::ConnectRequested));
            }

            LinkState::Connecting => {
                info!("Attempting to connect to Wi-Fi...");

                let accepted =
                    run_connect_attempts(|try_no| issue_connect(&wifi, try_no), FreeRtos::delay_ms);
                if !accepted {
                    error!(
                        "Failed to connect to Wi-Fi, giving up after {} attempts",
                        CONNECT_ATTEMPTS
                    );
                    set_state(
                        &state,
                        LinkState::Connecting.on_event(LinkEvent::RetriesExhausted),
                    );
                    continue;
                }

                // Address acquisition continues in the background; readiness
                // is observed through is_connected's bounded poll.
                match result_rx.recv() {
                    Ok(DriverResult::ConnectResult) => {
                        info!("Wi-Fi connected to the AP");
                        set_state(
                            &state,
                            LinkState::Connecting.on_event(LinkEvent::ConnectResult),
                        );
                    }
                    Ok(DriverResult::DisconnectResult) => {
                        error!("Association failed, returning to idle");
                        set_state(
                            &state,
                            LinkState::Connecting.on_event(LinkEvent::RetriesExhausted),
                        );
                    }
                    Err(_) => break,
                }
            }

            LinkState::Connected => {
                match result_rx.recv() {
                    Ok(DriverResult::DisconnectResult) => {
                        info!("Wi-Fi disconnected from the AP");
                        set_state(
                            &state,
                            LinkState::Connected.on_event(LinkEvent::DisconnectResult),
                        );
                    }
                    // Stray connect results carry no transition here
                    Ok(DriverResult::ConnectResult) => {}
                    Err(_) => break,
                }
            }
        }
    }

    error!("Wi-Fi agent control loop exited");
}
