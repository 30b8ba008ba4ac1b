use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use pulselog_frame::{pulse, FrameError, Inbound, LogRecord, NotificationReader, Pulse};
use pulselog_transport::{ChannelEndpoint, ChannelName, ChannelSender, Namespace};
use tracing::{debug, info, trace, warn};

use crate::error::{Result, ServerError};
use crate::shutdown::{self, WakeupRegistration};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of a [`MessageServer`]. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Running,
    Stopped,
}

impl ServerState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            IDLE => ServerState::Idle,
            RUNNING => ServerState::Running,
            _ => ServerState::Stopped,
        }
    }
}

/// Why [`MessageServer::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was called, from a handler or another thread.
    Stopped,
    /// The process-wide shutdown flag was set.
    ShutdownRequested,
    /// The receive-error handler declared an error fatal.
    FatalError,
}

/// What the loop should do after a receive error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    Continue,
    Fatal,
}

/// The three operations a server loop dispatches to.
pub trait Handler {
    /// A pulse arrived. `server` can be used to stop the loop.
    fn on_pulse(&mut self, pulse: Pulse, server: &MessageServer);

    /// A record arrived. The loop replies to the sender once this returns.
    fn on_message(&mut self, record: LogRecord);

    /// Receiving or decoding failed.
    fn on_receive_error(&mut self, error: &FrameError) -> ErrorAction;
}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn on_pulse(&mut self, pulse: Pulse, server: &MessageServer) {
        (**self).on_pulse(pulse, server)
    }

    fn on_message(&mut self, record: LogRecord) {
        (**self).on_message(record)
    }

    fn on_receive_error(&mut self, error: &FrameError) -> ErrorAction {
        (**self).on_receive_error(error)
    }
}

/// Server behavior config.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Translate SIGINT/SIGTERM/SIGHUP into a shutdown request and wake this
    /// server when one arrives.
    pub handle_signals: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            handle_signals: true,
        }
    }
}

impl ServerConfig {
    /// Config for servers that leave signal handling to someone else.
    pub fn without_signals() -> Self {
        Self {
            handle_signals: false,
        }
    }
}

struct Shared {
    state: AtomicU8,
    waker: ChannelSender,
}

impl Shared {
    fn stop(&self) -> bool {
        if self
            .state
            .compare_exchange(RUNNING, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        if let Err(err) = self.waker.wake() {
            debug!(error = %err, "stop wake-up failed");
        }
        true
    }

    fn state(&self) -> ServerState {
        ServerState::from_raw(self.state.load(Ordering::Acquire))
    }
}

/// A blocking receive/dispatch loop on one registered channel.
///
/// The server owns its [`ChannelEndpoint`]; dropping the server deregisters
/// the channel. `run` blocks the calling thread, and `stop` may be called from
/// any thread, including from inside a handler.
pub struct MessageServer {
    _wakeup: Option<WakeupRegistration>,
    endpoint: ChannelEndpoint,
    shared: Arc<Shared>,
}

impl MessageServer {
    /// Register `name` in `namespace` and prepare a server for it.
    pub fn bind(namespace: &Namespace, name: &ChannelName, config: ServerConfig) -> Result<Self> {
        let endpoint = ChannelEndpoint::open(namespace, name)?;

        let wakeup = if config.handle_signals {
            shutdown::install_signal_handler()?;
            Some(shutdown::register_wakeup(endpoint.waker()?))
        } else {
            None
        };

        let shared = Arc::new(Shared {
            state: AtomicU8::new(IDLE),
            waker: endpoint.waker()?,
        });

        Ok(Self {
            _wakeup: wakeup,
            endpoint,
            shared,
        })
    }

    /// Validate `name` and bind.
    pub fn bind_str(namespace: &Namespace, name: &str, config: ServerConfig) -> Result<Self> {
        let name = ChannelName::new(name)?;
        Self::bind(namespace, &name, config)
    }

    /// Run the receive loop until stopped.
    ///
    /// Pulses go to [`Handler::on_pulse`]. Records go to
    /// [`Handler::on_message`] and are then answered, exactly once, so the
    /// sender is released. Interrupted receives are retried; other receive
    /// failures go to [`Handler::on_receive_error`]. Anything that arrives
    /// once the server is stopping is left undispatched.
    ///
    /// Fails with [`ServerError::AlreadyRunning`] or
    /// [`ServerError::AlreadyStopped`] if the server is not idle.
    pub fn run<H: Handler + ?Sized>(&self, handler: &mut H) -> Result<StopReason> {
        if let Err(current) = self.shared.state.compare_exchange(
            IDLE,
            RUNNING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return Err(match current {
                RUNNING => ServerError::AlreadyRunning,
                _ => ServerError::AlreadyStopped,
            });
        }

        info!(channel = %self.endpoint.name(), "server running");
        let mut reader = NotificationReader::new(&self.endpoint);

        let reason = loop {
            if let Some(reason) = self.pending_stop() {
                break reason;
            }

            let received = reader.receive();
            // Stopped while blocked: whatever woke us is not dispatched.
            if let Some(reason) = self.pending_stop() {
                break reason;
            }

            match received {
                Ok(Inbound::Pulse(pulse)) => {
                    trace!(code = pulse.code, name = pulse::pulse_name(pulse.code), "dispatching pulse");
                    handler.on_pulse(pulse, self);
                }
                Ok(Inbound::Message { record, reply }) => {
                    handler.on_message(record);
                    if let Err(err) = reader.reply(reply) {
                        debug!(error = %err, "reply to sender failed");
                    }
                }
                Err(err) if err.is_interrupted() => {
                    trace!("receive interrupted");
                }
                Err(err) => {
                    if handler.on_receive_error(&err) == ErrorAction::Fatal {
                        warn!(error = %err, "fatal receive error");
                        self.mark_stopped();
                        break StopReason::FatalError;
                    }
                }
            }
        };

        info!(channel = %self.endpoint.name(), ?reason, "server stopped");
        Ok(reason)
    }

    /// Stop a running loop.
    ///
    /// Returns true if this call stopped the server. Further calls, and calls
    /// on a server that never ran, do nothing and return false.
    pub fn stop(&self) -> bool {
        self.shared.stop()
    }

    /// A handle that can stop this server from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> ServerState {
        self.shared.state()
    }

    pub fn name(&self) -> &ChannelName {
        self.endpoint.name()
    }

    /// The registered channel socket path.
    pub fn path(&self) -> &Path {
        self.endpoint.path()
    }

    fn pending_stop(&self) -> Option<StopReason> {
        if self.state() != ServerState::Running {
            return Some(StopReason::Stopped);
        }
        if shutdown::is_shutdown_requested() {
            self.mark_stopped();
            return Some(StopReason::ShutdownRequested);
        }
        None
    }

    fn mark_stopped(&self) {
        self.shared.state.store(STOPPED, Ordering::Release);
    }
}

impl std::fmt::Debug for MessageServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageServer")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

/// Cloneable, thread-safe stop switch for a [`MessageServer`].
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// Same contract as [`MessageServer::stop`].
    pub fn stop(&self) -> bool {
        self.shared.stop()
    }

    pub fn state(&self) -> ServerState {
        self.shared.state()
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle")
            .field("state", &self.state())
            .finish()
    }
}
