use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, trace};

use crate::endpoint::{probe, socket_identity};
use crate::error::{Result, TransportError};
use crate::name::ChannelName;
use crate::namespace::{check_path_len, Namespace};
use crate::traits::Outbound;

static NEXT_REPLY_SEQ: AtomicU64 = AtomicU64::new(1);

/// An outbound link to a registered channel that can receive replies.
///
/// The connection binds its own reply socket next to the channel socket so
/// the server can acknowledge each request. The reply socket is removed on
/// drop.
pub struct Connection {
    socket: UnixDatagram,
    channel_path: PathBuf,
    reply_path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl Connection {
    /// Connect to the channel registered as `name` in `namespace`.
    ///
    /// Fails with [`TransportError::Connect`] when no live server holds the
    /// name.
    pub fn open(namespace: &Namespace, name: &ChannelName) -> Result<Self> {
        let channel_path = namespace.channel_path(name);
        probe(&channel_path).map_err(|source| TransportError::Connect {
            path: channel_path.clone(),
            source,
        })?;

        let seq = NEXT_REPLY_SEQ.fetch_add(1, Ordering::Relaxed);
        let reply_path = namespace.reply_path(name, seq);
        check_path_len(&reply_path)?;
        if socket_identity(&reply_path).is_some() {
            debug!(path = ?reply_path, "removing stale reply socket");
            let _ = std::fs::remove_file(&reply_path);
        }

        let socket = UnixDatagram::bind(&reply_path).map_err(|source| TransportError::Connect {
            path: reply_path.clone(),
            source,
        })?;
        let _ = std::fs::set_permissions(&reply_path, std::fs::Permissions::from_mode(0o600));
        let created_inode = socket_identity(&reply_path);

        debug!(path = ?channel_path, "connected to channel");

        Ok(Self {
            socket,
            channel_path,
            reply_path,
            created_inode,
        })
    }

    /// Send one datagram to the channel (blocking).
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        self.drain_replies()?;
        send_loop(&self.socket, payload, &self.channel_path)
    }

    /// Wait for the server's reply to the last request.
    ///
    /// `None` waits indefinitely. A timeout surfaces as an I/O error of kind
    /// `WouldBlock` or `TimedOut` depending on the platform.
    pub fn recv_reply(&self, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.filter(|t| !t.is_zero());
        self.socket.set_read_timeout(timeout)?;
        let mut buf = [0u8; 16];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    pub fn channel_path(&self) -> &Path {
        &self.channel_path
    }

    pub fn reply_path(&self) -> &Path {
        &self.reply_path
    }

    /// Discard replies left over from requests that timed out.
    fn drain_replies(&self) -> Result<()> {
        self.socket.set_nonblocking(true)?;
        let mut buf = [0u8; 16];
        let mut drained = 0usize;
        let outcome = loop {
            match self.socket.recv(&mut buf) {
                Ok(_) => drained += 1,
                Err(err) if err.kind() == ErrorKind::WouldBlock => break Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => break Err(TransportError::Io(err)),
            }
        };
        self.socket.set_nonblocking(false)?;
        if drained > 0 {
            trace!(drained, "discarded late replies");
        }
        outcome
    }
}

impl Outbound for Connection {
    fn send(&self, payload: &[u8]) -> Result<()> {
        Connection::send(self, payload)
    }

    fn await_reply(&self, timeout: Option<Duration>) -> Result<()> {
        self.recv_reply(timeout)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("channel_path", &self.channel_path)
            .field("reply_path", &self.reply_path)
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(expected) = self.created_inode {
            if socket_identity(&self.reply_path) == Some(expected) {
                let _ = std::fs::remove_file(&self.reply_path);
            }
        }
    }
}

/// A one-way sender to a channel.
///
/// Uses an unbound socket, so the server cannot reply to what it sends. This
/// is the right tool for pulses and wake-ups.
#[derive(Debug)]
pub struct ChannelSender {
    socket: UnixDatagram,
    path: PathBuf,
}

impl ChannelSender {
    /// Open a blocking sender to a live channel.
    pub fn open(namespace: &Namespace, name: &ChannelName) -> Result<Self> {
        let path = namespace.channel_path(name);
        probe(&path).map_err(|source| TransportError::Connect {
            path: path.clone(),
            source,
        })?;
        let socket = UnixDatagram::unbound()?;
        Ok(Self { socket, path })
    }

    pub(crate) fn waker_for(path: &Path) -> Result<Self> {
        let socket = UnixDatagram::unbound()?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            path: path.to_path_buf(),
        })
    }

    /// Send one datagram to the channel.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        send_loop(&self.socket, payload, &self.path)
    }

    /// Queue an empty wake-up datagram. A full queue counts as delivered.
    pub fn wake(&self) -> Result<()> {
        match self.socket.send_to(&[], &self.path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Outbound for ChannelSender {
    fn send(&self, payload: &[u8]) -> Result<()> {
        ChannelSender::send(self, payload)
    }
}

fn send_loop(socket: &UnixDatagram, payload: &[u8], path: &Path) -> Result<()> {
    loop {
        match socket.send_to(payload, path) {
            Ok(_) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
}
