// User button - ISR-fed retrigger debounce producing logical press events

use std::num::NonZeroU32;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use esp_idf_hal::delay::{TickType, BLOCK};
use esp_idf_hal::gpio::{AnyIOPin, Input, InterruptType, PinDriver, Pull};
use esp_idf_hal::task::notification::Notification;
use log::{info, warn};

use ota_node_core::debounce::{RetriggerDebounce, SETTLE_WINDOW_MS};

use crate::system::fatal;

const DEBOUNCE_THREAD_STACK_SIZE: usize = 3072;

/// One debounced press. Consecutive raw edges inside the settle window
/// collapse into a single event.
#[derive(Debug, Clone, Copy)]
pub struct PressEvent;

/// Consumer side of the press channel. Held by the power controller, which
/// takes one event per wait.
pub struct ButtonListener {
    events: Receiver<PressEvent>,
}

impl ButtonListener {
    /// Configure the button line, hook its interrupt and start the debounce
    /// thread. Errors here are hardware/config defects; the caller treats
    /// them as fatal.
    pub fn start(pin: AnyIOPin) -> Result<Self> {
        let mut button = PinDriver::input(pin)?;
        button.set_pull(Pull::Up)?;
        button.set_interrupt_type(InterruptType::LowLevel)?;

        // Max one queued press, like a binary semaphore: presses arriving
        // while one is still unconsumed are dropped, not queued up.
        let (press_tx, press_rx) = mpsc::sync_channel(1);

        thread::Builder::new()
            .name("button-debounce".to_string())
            .stack_size(DEBOUNCE_THREAD_STACK_SIZE)
            .spawn(move || debounce_loop(button, press_tx))?;

        info!("Button listener started");
        Ok(Self { events: press_rx })
    }

    /// Block until the next logical press.
    pub fn wait_press(&self) {
        if self.events.recv().is_err() {
            fatal::halt("button debounce thread is gone");
        }
    }
}

fn now_ms(since: &Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

fn debounce_loop(mut button: PinDriver<'static, AnyIOPin, Input>, press_tx: SyncSender<PressEvent>) {
    let notification = Notification::new();
    let notifier = notification.notifier();

    // The ISR only posts a task notification; everything else happens on
    // this thread.
    let subscribed = unsafe {
        button.subscribe(move || {
            notifier.notify_and_yield(NonZeroU32::new(1).unwrap());
        })
    };
    if subscribed.is_err() {
        fatal::halt("failed to attach button interrupt handler");
    }

    let started = Instant::now();
    let mut filter = RetriggerDebounce::new(SETTLE_WINDOW_MS);

    loop {
        // Arm the line and sleep until the first raw edge.
        if button.enable_interrupt().is_err() {
            fatal::halt("failed to enable button interrupt");
        }
        notification.wait(BLOCK);
        filter.on_edge(now_ms(&started));

        // Absorb further edges; each one restarts the settle window.
        loop {
            let now = now_ms(&started);
            if filter.fire(now) {
                if press_tx.try_send(PressEvent).is_err() {
                    warn!("Press dropped, previous one not consumed yet");
                }
                break;
            }

            let wait_ms = filter.time_to_fire(now).unwrap_or(0).max(1);
            if button.enable_interrupt().is_err() {
                fatal::halt("failed to enable button interrupt");
            }
            if notification
                .wait(TickType::from(Duration::from_millis(wait_ms)).ticks())
                .is_some()
            {
                filter.on_edge(now_ms(&started));
            }
        }
    }
}
