use std::time::Duration;

/// Errors reported by [`LogClient::try_send`](crate::LogClient::try_send) and
/// client construction.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error (invalid name, no server on the channel).
    #[error("transport error: {0}")]
    Transport(#[from] pulselog_transport::TransportError),

    /// Frame-level error (send failed, reply missing).
    #[error("frame error: {0}")]
    Frame(#[from] pulselog_frame::FrameError),

    /// Not connected and the last attempt was too recent to try again.
    #[error("not connected to '{channel}'; next attempt allowed in {retry_in:?}")]
    Backoff { channel: String, retry_in: Duration },
}

pub type Result<T> = std::result::Result<T, ClientError>;
