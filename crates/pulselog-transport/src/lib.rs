//! Named datagram channels.
//!
//! A channel is a Unix datagram socket registered under a validated
//! [`ChannelName`] inside a [`Namespace`] directory. The server side owns a
//! [`ChannelEndpoint`]; clients reach it through a [`Connection`] (request and
//! reply) or a [`ChannelSender`] (one-way).
//!
//! This is the lowest layer of pulselog. Everything else builds on the types
//! provided here.

#[cfg(unix)]
pub mod connection;
#[cfg(unix)]
pub mod endpoint;
pub mod error;
pub mod name;
pub mod namespace;
pub mod traits;

#[cfg(unix)]
pub use connection::{ChannelSender, Connection};
#[cfg(unix)]
pub use endpoint::{ChannelEndpoint, PeerAddr};
pub use error::{Result, TransportError};
pub use name::ChannelName;
pub use namespace::{Namespace, RUNTIME_DIR_ENV};
pub use traits::Outbound;
