use std::time::Duration;

use bytes::BytesMut;
use pulselog_transport::Outbound;

use crate::codec::{encode_pulse, encode_record, Pulse, Severity, MAX_DATAGRAM};
use crate::error::Result;

/// Default time a record sender waits for the server's reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for the notification writer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// How long to wait for the reply to a record. `None` waits forever.
    pub reply_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Some(DEFAULT_REPLY_TIMEOUT),
        }
    }
}

/// Encodes and sends notifications over any [`Outbound`] link.
pub struct NotificationWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Outbound> NotificationWriter<T> {
    /// Create a new writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_DATAGRAM),
            config,
        }
    }

    /// Send a one-way pulse.
    pub fn send_pulse(&mut self, code: i8, value: i32) -> Result<()> {
        self.buf.clear();
        encode_pulse(&Pulse::new(code, value), &mut self.buf);
        self.inner.send(&self.buf)?;
        Ok(())
    }

    /// Send a record and wait for the receiver to acknowledge it.
    ///
    /// Text beyond the record buffer is cut off. Returns the number of text
    /// bytes that were sent.
    pub fn send_record(&mut self, severity: Severity, text: &str) -> Result<usize> {
        self.buf.clear();
        let written = encode_record(severity, text.as_bytes(), &mut self.buf);
        self.inner.send(&self.buf)?;
        self.inner.await_reply(self.config.reply_timeout)?;
        Ok(written)
    }
}
