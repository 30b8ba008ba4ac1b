use pulselog_frame::{pulse, FrameError, LogRecord, Pulse};
use tracing::trace;

use crate::error::{Result, ServerError};
use crate::server::{ErrorAction, Handler, MessageServer, ServerState, StopReason};
use crate::sink::Sink;

/// Timestamp layout of every log line, in local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub const STARTED_LINE: &str = "Logger has been started.";
pub const STOPPED_LINE: &str = "Logger has been stopped.";
pub const SHUTDOWN_LINE: &str = "Received shutdown pulse - stopping...";

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

type Clock = Box<dyn Fn() -> String + Send>;

/// Handler that turns records into `<timestamp> [<SEVERITY>] <text>` lines.
pub struct LogRecordServer<S> {
    sink: S,
    clock: Clock,
    handled: u64,
}

impl<S: Sink> LogRecordServer<S> {
    pub fn new(sink: S) -> Self {
        Self::with_clock(sink, local_timestamp)
    }

    /// Use `clock` instead of the local wall clock for timestamps.
    pub fn with_clock(sink: S, clock: impl Fn() -> String + Send + 'static) -> Self {
        Self {
            sink,
            clock: Box::new(clock),
            handled: 0,
        }
    }

    pub fn format_line(&self, record: &LogRecord) -> String {
        format!(
            "{} [{}] {}",
            (self.clock)(),
            record.severity.label(),
            record.text
        )
    }

    /// Run `server` with this handler, bracketing the loop with the start and
    /// stop lines.
    pub fn serve(&mut self, server: &MessageServer) -> Result<StopReason> {
        match server.state() {
            ServerState::Idle => {}
            ServerState::Running => return Err(ServerError::AlreadyRunning),
            ServerState::Stopped => return Err(ServerError::AlreadyStopped),
        }

        self.emit(STARTED_LINE);
        let outcome = server.run(self);
        self.emit(STOPPED_LINE);
        outcome
    }

    pub fn records_handled(&self) -> u64 {
        self.handled
    }

    fn emit(&mut self, line: &str) {
        self.sink.write(line);
        self.sink.flush();
    }
}

impl<S: Sink> Handler for LogRecordServer<S> {
    fn on_pulse(&mut self, pulse: Pulse, server: &MessageServer) {
        if pulse.code == pulse::SHUTDOWN {
            self.emit(SHUTDOWN_LINE);
            server.stop();
        } else {
            trace!(
                code = pulse.code,
                value = pulse.value,
                name = pulse::pulse_name(pulse.code),
                "ignoring pulse"
            );
        }
    }

    fn on_message(&mut self, record: LogRecord) {
        let line = self.format_line(&record);
        self.emit(&line);
        self.handled += 1;
    }

    fn on_receive_error(&mut self, error: &FrameError) -> ErrorAction {
        self.emit(&format!("Receive error: {error}"));
        ErrorAction::Continue
    }
}

impl<S> std::fmt::Debug for LogRecordServer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRecordServer")
            .field("handled", &self.handled)
            .finish_non_exhaustive()
    }
}
