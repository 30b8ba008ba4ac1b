use pulselog_transport::{ChannelEndpoint, PeerAddr};
use tracing::{debug, trace};

use crate::codec::{decode_notification, LogRecord, Notification, Pulse, MAX_DATAGRAM};
use crate::error::{FrameError, Result};

/// One decoded inbound notification.
#[derive(Debug)]
pub enum Inbound {
    /// A one-way pulse. Never replied to.
    Pulse(Pulse),
    /// A record whose sender may be blocked until it is answered.
    Message { record: LogRecord, reply: ReplyToken },
}

/// The obligation to answer one received record.
///
/// Consumed by [`NotificationReader::reply`], so a record can be answered at
/// most once.
#[derive(Debug)]
#[must_use = "a received record must be answered exactly once"]
pub struct ReplyToken {
    to: PeerAddr,
}

impl ReplyToken {
    /// Returns false for one-way senders that cannot receive a reply.
    pub fn expects_reply(&self) -> bool {
        !self.to.is_unnamed()
    }
}

/// Receives notifications from a [`ChannelEndpoint`].
pub struct NotificationReader<'a> {
    endpoint: &'a ChannelEndpoint,
    buf: Box<[u8]>,
}

impl<'a> NotificationReader<'a> {
    pub fn new(endpoint: &'a ChannelEndpoint) -> Self {
        // One spare byte detects datagrams the kernel had to truncate.
        Self {
            endpoint,
            buf: vec![0u8; MAX_DATAGRAM + 1].into_boxed_slice(),
        }
    }

    /// Block until the next notification arrives.
    ///
    /// A datagram that fails to decode is still answered when its sender can
    /// take a reply, so a malformed request never leaves a client waiting.
    pub fn receive(&mut self) -> Result<Inbound> {
        let (len, from) = self.endpoint.recv_from(&mut self.buf)?;

        let decoded = if len > MAX_DATAGRAM {
            Err(FrameError::PayloadTooLarge {
                size: len,
                max: MAX_DATAGRAM,
            })
        } else {
            decode_notification(&self.buf[..len])
        };

        match decoded {
            Ok(Notification::Pulse(pulse)) => {
                trace!(code = pulse.code, value = pulse.value, "pulse received");
                Ok(Inbound::Pulse(pulse))
            }
            Ok(Notification::Record(record)) => Ok(Inbound::Message {
                record,
                reply: ReplyToken { to: from },
            }),
            Err(err) => {
                if !from.is_unnamed() {
                    if let Err(reply_err) = self.endpoint.reply(&from, &[]) {
                        debug!(error = %reply_err, "could not release sender of malformed datagram");
                    }
                }
                Err(err)
            }
        }
    }

    /// Answer a received record with an empty reply.
    pub fn reply(&self, token: ReplyToken) -> Result<()> {
        self.endpoint.reply(&token.to, &[])?;
        Ok(())
    }

    /// Borrow the underlying endpoint.
    pub fn endpoint(&self) -> &ChannelEndpoint {
        self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::BytesMut;
    use pulselog_transport::{ChannelSender, Connection, Namespace};

    use super::*;
    use crate::codec::{encode_pulse, encode_record, Severity};
    use crate::pulse;

    fn temp_namespace(tag: &str) -> Namespace {
        Namespace::new(std::env::temp_dir().join(format!(
            "pl-rd-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        )))
    }

    #[test]
    fn reads_pulses_and_records_in_delivery_order() {
        let ns = temp_namespace("order");
        let endpoint = ChannelEndpoint::open_str(&ns, "logger").unwrap();
        let sender = ChannelSender::open(&ns, endpoint.name()).unwrap();

        let mut wire = BytesMut::new();
        encode_pulse(&Pulse::new(20, 7), &mut wire);
        sender.send(&wire).unwrap();
        wire.clear();
        encode_record(Severity::Error, b"boom", &mut wire);
        sender.send(&wire).unwrap();
        endpoint.wake().unwrap();

        let mut reader = NotificationReader::new(&endpoint);
        assert!(matches!(
            reader.receive().unwrap(),
            Inbound::Pulse(Pulse { code: 20, value: 7 })
        ));
        match reader.receive().unwrap() {
            Inbound::Message { record, reply } => {
                assert_eq!(record, LogRecord::new(Severity::Error, "boom"));
                assert!(!reply.expects_reply());
                reader.reply(reply).unwrap();
            }
            other => panic!("expected message, got {other:?}"),
        }
        assert!(matches!(
            reader.receive().unwrap(),
            Inbound::Pulse(Pulse { code: pulse::UNBLOCK, .. })
        ));

        drop(reader);
        drop(endpoint);
        let _ = std::fs::remove_dir_all(ns.root());
    }

    #[test]
    fn malformed_request_still_releases_sender() {
        let ns = temp_namespace("malformed");
        let endpoint = ChannelEndpoint::open_str(&ns, "logger").unwrap();
        let conn = Connection::open(&ns, endpoint.name()).unwrap();
        conn.send(&[0xEE, 1, 2, 3]).unwrap();

        let mut reader = NotificationReader::new(&endpoint);
        let err = reader.receive().unwrap_err();
        assert!(matches!(err, FrameError::UnknownKind(0xEE)));
        conn.recv_reply(Some(Duration::from_secs(5)))
            .expect("sender should be answered");

        drop(reader);
        drop(conn);
        drop(endpoint);
        let _ = std::fs::remove_dir_all(ns.root());
    }
}
