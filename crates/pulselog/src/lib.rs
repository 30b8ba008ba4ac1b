//! Minimal message-passing log service over local datagram channels.
//!
//! A log server registers a named channel and writes every record it receives
//! as `<timestamp> [<SEVERITY>] <text>` to its sink. Producers submit records
//! through a client that caches its connection and quietly recovers when the
//! server was not there yet or restarted. Out-of-band pulses, such as the
//! shutdown pulse, travel over the same channel.
//!
//! # Crate Structure
//!
//! - [`transport`]: channel names, namespace, endpoints and connections
//! - [`frame`]: pulse and record wire format
//! - [`server`]: message loop, shutdown coordination, log record server
//!   (behind `server` feature)
//! - [`client`]: connection-caching client and process-wide instance (behind
//!   `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use pulselog_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pulselog_frame::*;
}

/// Re-export server types (requires `server` feature).
#[cfg(feature = "server")]
pub mod server {
    pub use pulselog_server::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use pulselog_client::*;
}

#[cfg(feature = "client")]
pub use pulselog_client::{log_error, log_info};
