use std::time::Duration;

use crate::error::Result;

/// Something that can deliver datagrams to a channel.
///
/// Implemented by [`Connection`](crate::Connection), which can also wait for
/// the server's reply, and by [`ChannelSender`](crate::ChannelSender), which
/// is one-way only.
pub trait Outbound {
    /// Send one datagram to the channel.
    fn send(&self, payload: &[u8]) -> Result<()>;

    /// Block until the receiver replies to the last request.
    ///
    /// One-way senders return immediately.
    fn await_reply(&self, timeout: Option<Duration>) -> Result<()> {
        let _ = timeout;
        Ok(())
    }
}

impl<T: Outbound + ?Sized> Outbound for &T {
    fn send(&self, payload: &[u8]) -> Result<()> {
        (**self).send(payload)
    }

    fn await_reply(&self, timeout: Option<Duration>) -> Result<()> {
        (**self).await_reply(timeout)
    }
}
