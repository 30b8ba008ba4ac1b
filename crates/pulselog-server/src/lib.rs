//! Server side of pulselog.
//!
//! [`MessageServer`] owns a registered channel and runs the blocking receive
//! loop, dispatching pulses, records and receive errors to a [`Handler`].
//! [`LogRecordServer`] is the handler that formats records and writes them to
//! a [`Sink`]. The [`shutdown`] module holds the process-wide shutdown flag and
//! the OS signal translation.
//!
//! # Example
//!
//! ```no_run
//! use pulselog_server::{ConsoleSink, LogRecordServer, MessageServer, ServerConfig};
//! use pulselog_transport::Namespace;
//!
//! # fn main() -> pulselog_server::Result<()> {
//! let server = MessageServer::bind_str(&Namespace::from_env(), "logger", ServerConfig::default())?;
//! let mut logger = LogRecordServer::new(ConsoleSink::new());
//! logger.serve(&server)?;
//! # Ok(())
//! # }
//! ```

#![cfg(unix)]

pub mod error;
pub mod logger;
pub mod server;
pub mod shutdown;
pub mod sink;

pub use error::{Result, ServerError};
pub use logger::{local_timestamp, LogRecordServer, TIMESTAMP_FORMAT};
pub use server::{
    ErrorAction, Handler, MessageServer, ServerConfig, ServerState, StopHandle, StopReason,
};
pub use shutdown::{install_signal_handler, is_shutdown_requested, request_shutdown};
pub use sink::{ConsoleSink, FileSink, MemorySink, Sink};
