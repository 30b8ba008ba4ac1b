//! Wire format for pulselog channels.
//!
//! Every datagram on a channel is one notification:
//! - an empty datagram is a wake-up,
//! - `"P"` starts a fixed-size pulse (code + value),
//! - `"R"` starts a log record (severity + NUL-terminated text of at most
//!   5118 bytes).
//!
//! [`NotificationReader`] decodes what an endpoint receives and tracks the
//! reply owed to each record; [`NotificationWriter`] encodes and sends.

pub mod codec;
pub mod error;
pub mod pulse;
#[cfg(unix)]
pub mod reader;
pub mod writer;

pub use codec::{
    decode_notification, encode_pulse, encode_record, truncate_text,
    LogRecord, Notification, Pulse, Severity, MAX_DATAGRAM, MAX_TEXT_LEN, TEXT_CAPACITY,
};
pub use error::{FrameError, Result};
#[cfg(unix)]
pub use reader::{Inbound, NotificationReader, ReplyToken};
pub use writer::{FrameConfig, NotificationWriter, DEFAULT_REPLY_TIMEOUT};
