use std::path::PathBuf;

/// Errors that can occur while setting up or starting a server.
///
/// Nothing that happens inside a running receive loop is reported here; those
/// failures go to the handler instead.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Transport-level error (invalid name, registration failure).
    #[error("transport error: {0}")]
    Transport(#[from] pulselog_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] pulselog_frame::FrameError),

    /// `run` was called while the loop was already running.
    #[error("server is already running")]
    AlreadyRunning,

    /// `run` was called after the server had stopped.
    #[error("server has already stopped")]
    AlreadyStopped,

    /// The OS signal handler could not be installed.
    #[error("signal handler setup failed: {0}")]
    Signal(String),

    /// A sink could not be opened.
    #[error("cannot open log file {path}: {source}")]
    Sink {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ServerError>;
