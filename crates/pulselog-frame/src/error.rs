use pulselog_transport::TransportError;

/// Errors that can occur while encoding, decoding or moving notifications.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The datagram starts with a kind byte this version does not know.
    #[error("unknown notification kind 0x{0:02x}")]
    UnknownKind(u8),

    /// The datagram has the wrong size for its kind.
    #[error("malformed {kind} notification ({len} bytes)")]
    Malformed { kind: &'static str, len: usize },

    /// The datagram exceeds the largest notification on the wire.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The channel transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// Returns true when the receive call was interrupted by a signal.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, FrameError::Transport(err) if err.is_interrupted())
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
