//! Client side of pulselog.
//!
//! [`LogClient`] caches one connection to a log channel and submits records
//! over it, reconnecting when the server was missing or went away. Producers
//! that want a single shared client install one with
//! [`global::initialize`] and log through [`log_info!`] and [`log_error!`].
//!
//! ```no_run
//! use pulselog_client::{global, log_info, ClientConfig, LogClient};
//!
//! # fn main() -> pulselog_client::Result<()> {
//! let config = ClientConfig::default_channel()?.with_tag("app");
//! global::initialize(LogClient::new(config));
//! log_info!("started with {} workers", 4);
//! # Ok(())
//! # }
//! ```

#![cfg(unix)]

pub mod client;
pub mod error;
pub mod global;

pub use client::{ClientConfig, LogClient, DEFAULT_CHANNEL, DEFAULT_RETRY_INTERVAL};
pub use error::{ClientError, Result};
pub use pulselog_frame::Severity;
