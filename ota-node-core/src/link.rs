//! Connectivity state machine and connect retry policy.
//!
//! The firmware's Wi-Fi agent owns one `LinkState` and mutates it only from
//! its control loop; everything here is the pure half of that loop so the
//! transitions can be tested on the host.

use core::fmt;

/// Number of driver connect requests per `connect()` before giving up.
pub const CONNECT_ATTEMPTS: u8 = 5;

/// Pause between driver connect requests.
pub const CONNECT_RETRY_SPACING_MS: u32 = 500;

/// Poll interval used by the bounded `is_connected` wait.
pub const CONNECTED_POLL_INTERVAL_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Connected,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Idle => "idle",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Outcome of a `connect()` request against the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectDecision {
    /// Already connected; report success without touching the loop.
    AlreadyConnected,
    /// Signal the control loop to begin connecting.
    Begin,
    /// A connect is already in flight; requests cannot be queued.
    Busy,
}

pub fn request_connect(state: LinkState) -> ConnectDecision {
    match state {
        LinkState::Connected => ConnectDecision::AlreadyConnected,
        LinkState::Idle => ConnectDecision::Begin,
        LinkState::Connecting => ConnectDecision::Busy,
    }
}

/// A disconnect request is only valid while connected.
pub fn may_disconnect(state: LinkState) -> bool {
    state == LinkState::Connected
}

/// Events consumed by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// `connect()` released the connect signal.
    ConnectRequested,
    /// The driver accepted a connect request and the connect-result event
    /// arrived.
    ConnectResult,
    /// All driver connect attempts were rejected.
    RetriesExhausted,
    /// The disconnect-result event arrived.
    DisconnectResult,
}

impl LinkState {
    /// Single-step transition of the control loop. Events that do not apply
    /// to the current state leave it unchanged.
    pub fn on_event(self, event: LinkEvent) -> LinkState {
        match (self, event) {
            (LinkState::Idle, LinkEvent::ConnectRequested) => LinkState::Connecting,
            (LinkState::Connecting, LinkEvent::ConnectResult) => LinkState::Connected,
            (LinkState::Connecting, LinkEvent::RetriesExhausted) => LinkState::Idle,
            (LinkState::Connected, LinkEvent::DisconnectResult) => LinkState::Idle,
            (state, _) => state,
        }
    }
}

/// Drive a driver connect request through the retry schedule. `attempt` is
/// called once per try; `wait` runs between tries. Returns `true` as soon as
/// the driver accepts, `false` once the schedule is exhausted.
pub fn run_connect_attempts<E>(
    mut attempt: impl FnMut(u8) -> Result<(), E>,
    mut wait: impl FnMut(u32),
) -> bool {
    for try_no in 1..=CONNECT_ATTEMPTS {
        if attempt(try_no).is_ok() {
            return true;
        }
        if try_no < CONNECT_ATTEMPTS {
            wait(CONNECT_RETRY_SPACING_MS);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_only_begins_from_idle() {
        assert_eq!(request_connect(LinkState::Idle), ConnectDecision::Begin);
        assert_eq!(
            request_connect(LinkState::Connected),
            ConnectDecision::AlreadyConnected
        );
        assert_eq!(request_connect(LinkState::Connecting), ConnectDecision::Busy);
    }

    #[test]
    fn disconnect_requires_connected() {
        assert!(may_disconnect(LinkState::Connected));
        assert!(!may_disconnect(LinkState::Idle));
        assert!(!may_disconnect(LinkState::Connecting));
    }

    #[test]
    fn happy_path_transitions() {
        let s = LinkState::Idle.on_event(LinkEvent::ConnectRequested);
        assert_eq!(s, LinkState::Connecting);
        let s = s.on_event(LinkEvent::ConnectResult);
        assert_eq!(s, LinkState::Connected);
        let s = s.on_event(LinkEvent::DisconnectResult);
        assert_eq!(s, LinkState::Idle);
    }

    #[test]
    fn exhausted_retries_return_to_idle() {
        let s = LinkState::Connecting.on_event(LinkEvent::RetriesExhausted);
        assert_eq!(s, LinkState::Idle);
    }

    #[test]
    fn stray_events_leave_state_unchanged() {
        assert_eq!(
            LinkState::Idle.on_event(LinkEvent::DisconnectResult),
            LinkState::Idle
        );
        assert_eq!(
            LinkState::Connected.on_event(LinkEvent::ConnectRequested),
            LinkState::Connected
        );
        assert_eq!(
            LinkState::Connecting.on_event(LinkEvent::ConnectRequested),
            LinkState::Connecting
        );
    }

    #[test]
    fn retry_accepts_on_third_attempt() {
        let mut calls = 0u8;
        let mut waits = 0u8;
        let accepted = run_connect_attempts(
            |try_no| {
                calls += 1;
                if try_no == 3 {
                    Ok(())
                } else {
                    Err(())
                }
            },
            |ms| {
                assert_eq!(ms, CONNECT_RETRY_SPACING_MS);
                waits += 1;
            },
        );
        assert!(accepted);
        assert_eq!(calls, 3);
        assert_eq!(waits, 2);
    }

    #[test]
    fn retry_never_exceeds_the_bound() {
        let mut calls = 0u8;
        let accepted = run_connect_attempts(
            |_| {
                calls += 1;
                Err::<(), ()>(())
            },
            |_| {},
        );
        assert!(!accepted);
        assert_eq!(calls, CONNECT_ATTEMPTS);
    }

    #[test]
    fn first_attempt_success_skips_waits() {
        let mut waits = 0u8;
        let accepted = run_connect_attempts(|_| Ok::<(), ()>(()), |_| waits += 1);
        assert!(accepted);
        assert_eq!(waits, 0);
    }
}
