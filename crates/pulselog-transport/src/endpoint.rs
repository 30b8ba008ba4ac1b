use std::io::ErrorKind;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{SocketAddr, UnixDatagram};
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::connection::ChannelSender;
use crate::error::{Result, TransportError};
use crate::name::ChannelName;
use crate::namespace::{check_path_len, Namespace};

/// Address of the socket that sent a datagram to an endpoint.
#[derive(Debug, Clone)]
pub struct PeerAddr(SocketAddr);

impl PeerAddr {
    /// Unnamed senders (one-way pulse senders) cannot be replied to.
    pub fn is_unnamed(&self) -> bool {
        self.0.is_unnamed()
    }

    pub fn as_pathname(&self) -> Option<&Path> {
        self.0.as_pathname()
    }
}

/// A registered, receive-capable channel.
///
/// Opening an endpoint binds a Unix datagram socket at the channel path inside
/// a [`Namespace`]. Dropping it wakes any thread blocked in
/// [`recv_from`](Self::recv_from) and removes the registration.
pub struct ChannelEndpoint {
    socket: UnixDatagram,
    /// Unbound, non-blocking socket used for replies and self wake-ups so
    /// neither can stall the receiving thread.
    control: UnixDatagram,
    name: ChannelName,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl ChannelEndpoint {
    /// Default permission mode for registered channel sockets.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

    /// Register `name` in `namespace`.
    ///
    /// A leftover socket from a dead server is reclaimed, and so are reply
    /// sockets of this channel left behind by dead clients. A socket that
    /// still has a live receiver, or a path that is not a socket, fails with
    /// [`TransportError::Registration`].
    pub fn open(namespace: &Namespace, name: &ChannelName) -> Result<Self> {
        namespace.ensure_root()?;
        let path = namespace.channel_path(name);
        check_path_len(&path)?;

        reclaim_stale(&path)?;
        sweep_dead_replies(namespace, name);

        let socket = UnixDatagram::bind(&path).map_err(|source| TransportError::Registration {
            path: path.clone(),
            source,
        })?;

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE))
            .map_err(|source| TransportError::Registration {
                path: path.clone(),
                source,
            })?;
        let created_inode = socket_identity(&path);

        let control = UnixDatagram::unbound()?;
        control.set_nonblocking(true)?;

        info!(?path, channel = %name, "channel registered");

        Ok(Self {
            socket,
            control,
            name: name.clone(),
            path,
            created_inode,
        })
    }

    /// Validate `name` and register it.
    pub fn open_str(namespace: &Namespace, name: &str) -> Result<Self> {
        let name = ChannelName::new(name)?;
        Self::open(namespace, &name)
    }

    /// Block until a datagram arrives.
    ///
    /// Interrupted calls are returned to the caller rather than retried, so a
    /// server loop gets the chance to look at its shutdown flag.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, PeerAddr)> {
        let (len, addr) = self.socket.recv_from(buf)?;
        trace!(len, channel = %self.name, "datagram received");
        Ok((len, PeerAddr(addr)))
    }

    /// Send a reply datagram to the sender of a previous request.
    ///
    /// Unnamed senders are skipped. A full reply queue on the client side is
    /// reported as `WouldBlock` instead of blocking the receiver.
    pub fn reply(&self, to: &PeerAddr, payload: &[u8]) -> Result<()> {
        let Some(path) = to.as_pathname() else {
            trace!("sender is unnamed; reply skipped");
            return Ok(());
        };
        loop {
            match self.control.send_to(payload, path) {
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Queue an empty wake-up datagram on this channel.
    ///
    /// A full receive queue already guarantees the receiver will wake, so
    /// `WouldBlock` counts as success.
    pub fn wake(&self) -> Result<()> {
        match self.control.send_to(&[], &self.path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    /// A non-blocking one-way sender targeting this channel, suitable for
    /// waking the receiver from another thread.
    pub fn waker(&self) -> Result<ChannelSender> {
        ChannelSender::waker_for(&self.path)
    }

    pub fn name(&self) -> &ChannelName {
        &self.name
    }

    /// The registered socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for ChannelEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelEndpoint")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

impl Drop for ChannelEndpoint {
    fn drop(&mut self) {
        let _ = self.wake();
        if let Some(expected) = self.created_inode {
            if socket_identity(&self.path) == Some(expected) {
                debug!(path = ?self.path, "deregistering channel");
                let _ = std::fs::remove_file(&self.path);
            } else {
                debug!(
                    path = ?self.path,
                    "socket path identity changed; skipping cleanup"
                );
            }
        }
    }
}

/// `(dev, inode)` of the socket at `path`, if `path` is a socket.
pub(crate) fn socket_identity(path: &Path) -> Option<(u64, u64)> {
    let metadata = std::fs::symlink_metadata(path).ok()?;
    if metadata.file_type().is_socket() {
        Some((metadata.dev(), metadata.ino()))
    } else {
        None
    }
}

/// Returns `Ok(())` if something is receiving on the socket at `path`.
pub(crate) fn probe(path: &Path) -> std::io::Result<()> {
    let socket = UnixDatagram::unbound()?;
    socket.connect(path)
}

/// Assumes at most one server registers a given name at a time. The liveness
/// check and the removal are separate steps, so two servers racing for the
/// same stale name can both pass the check and the later one removes the
/// earlier one's fresh socket.
fn reclaim_stale(path: &Path) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(TransportError::Registration {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.file_type().is_socket() {
        return Err(TransportError::Registration {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                ErrorKind::AlreadyExists,
                "existing path is not a unix socket",
            ),
        });
    }

    match probe(path) {
        Ok(()) => Err(TransportError::Registration {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                ErrorKind::AddrInUse,
                "channel name is already registered by a live server",
            ),
        }),
        Err(_) => {
            debug!(?path, "removing stale channel socket");
            std::fs::remove_file(path).map_err(|source| TransportError::Registration {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn sweep_dead_replies(namespace: &Namespace, name: &ChannelName) {
    for path in namespace.reply_paths(name) {
        if socket_identity(&path).is_none() {
            continue;
        }
        match probe(&path) {
            Err(err) if err.kind() == ErrorKind::ConnectionRefused => {
                debug!(?path, "removing orphaned reply socket");
                let _ = std::fs::remove_file(&path);
            }
            _ => {}
        }
    }
}
