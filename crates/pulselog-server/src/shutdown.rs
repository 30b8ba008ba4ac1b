//! Process-wide shutdown coordination.
//!
//! A single set-only flag is shared by every [`MessageServer`] in the
//! process. [`request_shutdown`] only performs an atomic store, so it is safe
//! to call from a signal context. Setting the flag does not by itself unblock
//! a server sitting in its receive call: servers that opt into signal handling
//! register a wake-up sender here, and the signal path wakes all of them after
//! setting the flag.
//!
//! This module is the one place that keeps ambient global state. OS signal
//! dispositions are process-global, so the translation from SIGINT, SIGTERM
//! and SIGHUP to a shutdown request is installed at most once per process.
//!
//! [`MessageServer`]: crate::MessageServer

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use pulselog_transport::ChannelSender;
use tracing::{debug, info};

use crate::error::{Result, ServerError};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);
static SIGNAL_HANDLER: OnceLock<std::result::Result<(), String>> = OnceLock::new();
static WAKERS: Mutex<Vec<(u64, ChannelSender)>> = Mutex::new(Vec::new());
static NEXT_WAKER_ID: AtomicU64 = AtomicU64::new(1);

/// Ask every server in the process to stop. Idempotent.
pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::Release);
}

/// Returns true once a shutdown has been requested. Never reset.
pub fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Acquire)
}

/// Request shutdown and wake every registered server.
pub fn shutdown_and_wake() {
    request_shutdown();
    wake_all();
}

/// Send a wake-up datagram to every registered server channel.
pub fn wake_all() {
    let wakers = WAKERS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for (_, waker) in wakers.iter() {
        if let Err(err) = waker.wake() {
            debug!(path = ?waker.path(), error = %err, "wake-up failed");
        }
    }
}

/// Install the OS termination signal handler for this process.
///
/// Safe to call more than once: later calls return the outcome of the first.
pub fn install_signal_handler() -> Result<()> {
    SIGNAL_HANDLER
        .get_or_init(|| {
            ctrlc::set_handler(|| {
                info!("termination signal received; requesting shutdown");
                shutdown_and_wake();
            })
            .map_err(|err| err.to_string())
        })
        .clone()
        .map_err(ServerError::Signal)
}

/// Keeps a server's wake-up sender registered until dropped.
#[derive(Debug)]
pub struct WakeupRegistration {
    id: u64,
}

/// Register a channel to be woken when shutdown is requested through the
/// signal path or [`shutdown_and_wake`].
pub fn register_wakeup(waker: ChannelSender) -> WakeupRegistration {
    let id = NEXT_WAKER_ID.fetch_add(1, Ordering::Relaxed);
    WAKERS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push((id, waker));
    WakeupRegistration { id }
}

impl Drop for WakeupRegistration {
    fn drop(&mut self) {
        WAKERS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|(id, _)| *id != self.id);
    }
}

#[cfg(test)]
fn registered_wakers() -> usize {
    WAKERS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .len()
}
