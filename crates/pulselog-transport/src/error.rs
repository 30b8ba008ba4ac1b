use std::path::PathBuf;

/// Errors that can occur in channel transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The channel name failed validation.
    #[error("invalid channel name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Failed to register the channel name in the namespace.
    #[error("failed to register channel at {path}: {source}")]
    Registration {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the specified channel.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The namespace root directory could not be created.
    #[error("failed to prepare runtime directory {path}: {source}")]
    RuntimeDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on a channel socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

impl TransportError {
    /// The underlying OS error kind, when there is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Registration { source, .. }
            | TransportError::Connect { source, .. }
            | TransportError::RuntimeDir { source, .. }
            | TransportError::Io(source) => Some(source.kind()),
            _ => None,
        }
    }

    /// Returns true when a blocking call was interrupted by a signal.
    pub fn is_interrupted(&self) -> bool {
        self.io_kind() == Some(std::io::ErrorKind::Interrupted)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
