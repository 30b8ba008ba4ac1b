use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use pulselog_frame::{FrameConfig, NotificationWriter, Severity, DEFAULT_REPLY_TIMEOUT};
use pulselog_transport::{ChannelName, Connection, Namespace};
use tracing::debug;

use crate::error::{ClientError, Result};

/// Channel that log servers register by default.
pub const DEFAULT_CHANNEL: &str = "logger";

/// Minimum time between two implicit connection attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// How a [`LogClient`] finds its server and labels its records.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub namespace: Namespace,
    pub channel: ChannelName,
    /// Prefix put in front of every record text, followed by a space.
    /// Empty means no prefix.
    pub tag: String,
    /// How long a send waits for the server's acknowledgement.
    pub reply_timeout: Option<Duration>,
    /// Sends made while disconnected only try to connect if the previous
    /// attempt is at least this old. Zero retries on every send.
    pub retry_interval: Duration,
}

impl ClientConfig {
    pub fn new(channel: ChannelName) -> Self {
        Self {
            namespace: Namespace::from_env(),
            channel,
            tag: String::new(),
            reply_timeout: Some(DEFAULT_REPLY_TIMEOUT),
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Config for the channel `name`, validating it.
    pub fn for_channel(name: &str) -> Result<Self> {
        Ok(Self::new(ChannelName::new(name)?))
    }

    /// Config for the [`DEFAULT_CHANNEL`].
    pub fn default_channel() -> Result<Self> {
        Self::for_channel(DEFAULT_CHANNEL)
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }
}

struct State {
    writer: Option<NotificationWriter<Connection>>,
    last_attempt: Option<Instant>,
    tag: String,
}

/// Client side of a log channel.
///
/// Keeps at most one cached connection to the server. Sending while
/// disconnected tries to connect first; if that or the send itself fails, the
/// client drops the connection and the record is lost. Log calls never fail
/// loudly: use [`LogClient::try_send`] to see the error.
///
/// All methods take `&self`; concurrent senders are serialized.
pub struct LogClient {
    namespace: Namespace,
    channel: ChannelName,
    frame_config: FrameConfig,
    retry_interval: Duration,
    state: Mutex<State>,
}

impl LogClient {
    /// Create a disconnected client. Nothing is opened until the first send
    /// or [`reconnect`](Self::reconnect).
    pub fn new(config: ClientConfig) -> Self {
        Self {
            namespace: config.namespace,
            channel: config.channel,
            frame_config: FrameConfig {
                reply_timeout: config.reply_timeout,
            },
            retry_interval: config.retry_interval,
            state: Mutex::new(State {
                writer: None,
                last_attempt: None,
                tag: config.tag,
            }),
        }
    }

    pub fn send_info(&self, text: &str) {
        self.send(Severity::Info, text);
    }

    pub fn send_error(&self, text: &str) {
        self.send(Severity::Error, text);
    }

    /// Send a record, discarding any failure.
    pub fn send(&self, severity: Severity, text: &str) {
        if let Err(err) = self.try_send(severity, text) {
            debug!(channel = %self.channel, error = %err, "log record dropped");
        }
    }

    /// Send a record and wait for the server to take it.
    ///
    /// Returns the number of text bytes delivered, tag included; anything past
    /// the record capacity is cut off.
    pub fn try_send(&self, severity: Severity, text: &str) -> Result<usize> {
        let mut state = self.lock();

        let mut writer = match state.writer.take() {
            Some(writer) => writer,
            None => {
                if let Some(last) = state.last_attempt {
                    let elapsed = last.elapsed();
                    if elapsed < self.retry_interval {
                        return Err(ClientError::Backoff {
                            channel: self.channel.to_string(),
                            retry_in: self.retry_interval - elapsed,
                        });
                    }
                }
                self.open_writer(&mut state)?
            }
        };

        let payload = compose(&state.tag, text);
        match writer.send_record(severity, &payload) {
            Ok(written) => {
                state.writer = Some(writer);
                Ok(written)
            }
            Err(err) => {
                debug!(channel = %self.channel, error = %err, "dropping connection after failed send");
                state.last_attempt = Some(Instant::now());
                Err(err.into())
            }
        }
    }

    /// Drop any cached connection and open a new one right away, ignoring the
    /// retry interval. Returns whether the client is now connected.
    pub fn reconnect(&self) -> bool {
        let mut state = self.lock();
        state.writer = None;
        match self.open_writer(&mut state) {
            Ok(writer) => {
                state.writer = Some(writer);
                true
            }
            Err(err) => {
                debug!(channel = %self.channel, error = %err, "reconnect failed");
                false
            }
        }
    }

    /// Drop the cached connection, if any.
    pub fn disconnect(&self) {
        self.lock().writer = None;
    }

    /// Whether a connection is cached. A cached connection may still turn out
    /// to be dead on the next send.
    pub fn is_connected(&self) -> bool {
        self.lock().writer.is_some()
    }

    /// Replace the tag put in front of subsequent records.
    pub fn set_tag(&self, tag: impl Into<String>) {
        self.lock().tag = tag.into();
    }

    pub fn tag(&self) -> String {
        self.lock().tag.clone()
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn open_writer(&self, state: &mut State) -> Result<NotificationWriter<Connection>> {
        state.last_attempt = Some(Instant::now());
        let connection = Connection::open(&self.namespace, &self.channel)?;
        debug!(channel = %self.channel, "log client connected");
        Ok(NotificationWriter::with_config(
            connection,
            self.frame_config.clone(),
        ))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for LogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogClient")
            .field("channel", &self.channel)
            .field("namespace", &self.namespace)
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn compose(tag: &str, text: &str) -> String {
    if tag.is_empty() {
        text.to_owned()
    } else {
        format!("{tag} {text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_server(tag: &str) -> ClientConfig {
        ClientConfig::for_channel("nobody-home")
            .unwrap()
            .with_namespace(Namespace::new(std::env::temp_dir().join(format!(
                "pl-client-{tag}-{}",
                std::process::id()
            ))))
    }

    #[test]
    fn tag_is_prefixed_with_a_space() {
        assert_eq!(compose("app", "hello"), "app hello");
        assert_eq!(compose("", "hello"), "hello");
    }

    #[test]
    fn invalid_channel_is_rejected() {
        assert!(matches!(
            ClientConfig::for_channel("bad name"),
            Err(ClientError::Transport(_))
        ));
    }

    #[test]
    fn sending_without_server_is_silent() {
        let client = LogClient::new(missing_server("silent").with_retry_interval(Duration::ZERO));
        client.send_info("nobody listens");
        client.send_error("still nobody");
        assert!(!client.is_connected());
        assert!(!client.reconnect());
    }

    #[test]
    fn implicit_attempts_are_rate_limited() {
        let client =
            LogClient::new(missing_server("backoff").with_retry_interval(Duration::from_secs(60)));

        assert!(matches!(
            client.try_send(Severity::Info, "first"),
            Err(ClientError::Transport(_))
        ));
        assert!(matches!(
            client.try_send(Severity::Info, "second"),
            Err(ClientError::Backoff { .. })
        ));
        // Explicit reconnect ignores the interval and reports the real outcome.
        assert!(!client.reconnect());
    }

    #[test]
    fn tag_can_be_replaced() {
        let client = LogClient::new(missing_server("tag").with_tag("first"));
        assert_eq!(client.tag(), "first");
        client.set_tag("second");
        assert_eq!(client.tag(), "second");
    }
}
