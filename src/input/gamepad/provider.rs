//! GilRs gamepad provider - polls one controller into aim samples
//!
//! gilrs is not `Send`, so it lives on a dedicated polling thread. Every
//! `poll_interval_ms` the thread reads the bound sticks and hold button of
//! the selected gamepad and sends a [`Sample`] over a tokio channel.

use anyhow::{Context, Result};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::axis::axis_from_name;
use super::buttons::button_from_name;
use super::normalize::stick_to_raw;
use crate::aim::Sample;
use crate::config::{BindingConfig, GamepadConfig};

/// Resolved control bindings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bindings {
    pub move_x: Axis,
    pub move_y: Axis,
    pub aim_x: Axis,
    pub aim_y: Axis,
    pub hold: Button,
}

impl Bindings {
    pub fn from_config(config: &BindingConfig) -> Result<Self> {
        Ok(Self {
            move_x: axis_from_name(&config.move_x).context("gamepad.bindings.move_x")?,
            move_y: axis_from_name(&config.move_y).context("gamepad.bindings.move_y")?,
            aim_x: axis_from_name(&config.aim_x).context("gamepad.bindings.aim_x")?,
            aim_y: axis_from_name(&config.aim_y).context("gamepad.bindings.aim_y")?,
            hold: button_from_name(&config.hold).context("gamepad.bindings.hold")?,
        })
    }

    /// Read the current state of `gamepad` as one sample
    pub fn read(&self, gamepad: &Gamepad<'_>) -> Sample {
        let (move_x, move_y) = stick_to_raw(gamepad.value(self.move_x), gamepad.value(self.move_y));
        let (aim_x, aim_y) = stick_to_raw(gamepad.value(self.aim_x), gamepad.value(self.aim_y));
        Sample::new(move_x, move_y, aim_x, aim_y, gamepad.is_pressed(self.hold))
    }
}

/// Case-insensitive substring match; no pattern accepts any gamepad
pub fn name_matches(name: &str, pattern: Option<&str>) -> bool {
    match pattern {
        Some(p) => name.to_lowercase().contains(&p.to_lowercase()),
        None => true,
    }
}

/// Polling thread handle
pub struct GilrsProvider {
    shutdown_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl GilrsProvider {
    /// Start polling and send samples to `sample_tx`
    pub fn start(config: &GamepadConfig, sample_tx: mpsc::UnboundedSender<Sample>) -> Result<Self> {
        let bindings = Bindings::from_config(&config.bindings)?;
        let product_match = config.product_match.clone();
        let interval = Duration::from_millis(config.poll_interval_ms.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        let thread = std::thread::Builder::new()
            .name("gamepad-poll".to_string())
            .spawn(move || poll_loop(bindings, product_match, interval, sample_tx, shutdown_rx))
            .context("Failed to spawn gamepad polling thread")?;

        info!(
            "Gamepad provider started (poll every {:?}, match: {})",
            interval,
            config.product_match.as_deref().unwrap_or("any")
        );

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Stop polling and wait for the thread to exit
    pub fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel; the loop sees that
        self.shutdown_tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Gamepad polling thread panicked");
            }
        }
    }
}

impl Drop for GilrsProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn poll_loop(
    bindings: Bindings,
    product_match: Option<String>,
    interval: Duration,
    sample_tx: mpsc::UnboundedSender<Sample>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut gilrs = match Gilrs::new() {
        Ok(g) => {
            info!("GilRs initialized");
            g
        }
        Err(e) => {
            warn!("Failed to initialize GilRs: {:?}", e);
            return;
        }
    };

    let mut selected: Option<GamepadId> = None;
    let mut waiting_logged = false;

    loop {
        match shutdown_rx.try_recv() {
            Ok(_) | Err(mpsc::error::TryRecvError::Disconnected) => {
                info!("Gamepad provider shutting down");
                break;
            }
            Err(mpsc::error::TryRecvError::Empty) => {}
        }

        while let Some(Event { id, event, .. }) = gilrs.next_event() {
            match event {
                EventType::Connected => debug!("Gamepad connected: {:?}", id),
                EventType::Disconnected if selected == Some(id) => {
                    warn!("⚠️  Selected gamepad disconnected");
                    selected = None;
                    // Release everything so the output returns to neutral
                    if sample_tx.send(Sample::default()).is_err() {
                        return;
                    }
                }
                _ => {}
            }
        }

        if selected.is_none() {
            selected = gilrs
                .gamepads()
                .find(|(_, gp)| gp.is_connected() && name_matches(gp.name(), product_match.as_deref()))
                .map(|(id, gp)| {
                    info!("✅ Using gamepad {:?}: \"{}\"", id, gp.name());
                    id
                });

            if selected.is_none() && !waiting_logged {
                info!("⏳ Waiting for a matching gamepad...");
                waiting_logged = true;
            } else if selected.is_some() {
                waiting_logged = false;
            }
        }

        if let Some(id) = selected {
            let sample = bindings.read(&gilrs.gamepad(id));
            if sample_tx.send(sample).is_err() {
                debug!("Sample receiver closed, stopping gamepad polling");
                break;
            }
        }

        std::thread::sleep(interval);
    }
}
