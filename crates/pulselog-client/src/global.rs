//! Process-wide log client.
//!
//! The first successful [`initialize`] wins for the rest of the process.
//! [`log_info!`](crate::log_info) and [`log_error!`](crate::log_error) go
//! through the installed client and do nothing before one is installed.

use std::sync::OnceLock;

use tracing::warn;

use crate::client::LogClient;

static INSTANCE: OnceLock<LogClient> = OnceLock::new();

/// Install `client` as the process-wide instance and try to connect it.
///
/// Returns false, dropping `client`, if an instance already exists. A failed
/// connection attempt is not an error: the client reconnects on later sends.
pub fn initialize(client: LogClient) -> bool {
    let mut installed = false;
    let instance = INSTANCE.get_or_init(|| {
        installed = true;
        client
    });
    if installed && !instance.reconnect() {
        warn!(channel = %instance.channel(), "log server not reachable yet");
    }
    installed
}

/// The process-wide client, if one was installed.
pub fn instance() -> Option<&'static LogClient> {
    INSTANCE.get()
}

/// Whether [`initialize`] has succeeded in this process.
pub fn is_initialized() -> bool {
    INSTANCE.get().is_some()
}

/// Log an informational record through the process-wide client.
///
/// Takes `format!` arguments. Does nothing if no client is installed.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        if let ::std::option::Option::Some(client) = $crate::global::instance() {
            client.send_info(&::std::format!($($arg)+));
        }
    };
}

/// Log an error record through the process-wide client.
///
/// Takes `format!` arguments. Does nothing if no client is installed.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        if let ::std::option::Option::Some(client) = $crate::global::instance() {
            client.send_error(&::std::format!($($arg)+));
        }
    };
}
