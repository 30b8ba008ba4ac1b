use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::pulse;

/// Record text buffer size, terminator included.
pub const TEXT_CAPACITY: usize = 5119;

/// Longest text that travels on the wire.
pub const MAX_TEXT_LEN: usize = TEXT_CAPACITY - 1;

/// Kind byte of a pulse datagram ("P").
pub const KIND_PULSE: u8 = 0x50;

/// Kind byte of a record datagram ("R").
pub const KIND_RECORD: u8 = 0x52;

/// Pulse datagram: kind (1) + code (1) + value (4) = 6 bytes.
pub const PULSE_SIZE: usize = 6;

/// Largest datagram: kind (1) + severity (1) + text buffer (5119).
pub const MAX_DATAGRAM: usize = 2 + TEXT_CAPACITY;

/// Severity of a log record.
///
/// Codes other than `INFO` and `ERROR` are carried as [`Severity::Other`] and
/// render as `UNKNOWN`. A severity is identified by its wire code, so
/// `Other(0x31)` compares and hashes equal to `Error`; use
/// [`Severity::from_code`] or [`Severity::normalized`] to get the canonical
/// variant.
#[derive(Debug, Clone, Copy)]
pub enum Severity {
    Info,
    Error,
    Other(u8),
}

impl Severity {
    /// Wire code for [`Severity::Info`].
    pub const INFO_CODE: u8 = 0x30;
    /// Wire code for [`Severity::Error`].
    pub const ERROR_CODE: u8 = 0x31;

    pub fn from_code(code: u8) -> Self {
        match code {
            Self::INFO_CODE => Severity::Info,
            Self::ERROR_CODE => Severity::Error,
            other => Severity::Other(other),
        }
    }

    /// The canonical variant for this severity's wire code.
    pub fn normalized(self) -> Self {
        Self::from_code(self.code())
    }

    pub fn code(self) -> u8 {
        match self {
            Severity::Info => Self::INFO_CODE,
            Severity::Error => Self::ERROR_CODE,
            Severity::Other(code) => code,
        }
    }

    /// Tag rendered between brackets in a log line.
    pub fn label(self) -> &'static str {
        match self.normalized() {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
            Severity::Other(_) => "UNKNOWN",
        }
    }
}

impl PartialEq for Severity {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for Severity {}

impl Hash for Severity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Accepts `info`, `error` (any case) or a raw code `0..=255`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("info") {
            return Ok(Severity::Info);
        }
        if s.eq_ignore_ascii_case("error") {
            return Ok(Severity::Error);
        }
        s.parse::<u8>()
            .map(Severity::from_code)
            .map_err(|_| format!("unknown severity {s:?} (expected info, error or 0-255)"))
    }
}

/// A small out-of-band control datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub code: i8,
    pub value: i32,
}

impl Pulse {
    pub fn new(code: i8, value: i32) -> Self {
        Self { code, value }
    }

    /// The wake-up pulse an empty datagram decodes to.
    pub fn unblock() -> Self {
        Self::new(pulse::UNBLOCK, 0)
    }

    pub fn shutdown() -> Self {
        Self::new(pulse::SHUTDOWN, 0)
    }
}

/// A log record as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    pub text: String,
}

impl LogRecord {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }
}

/// Anything that arrives on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Pulse(Pulse),
    Record(LogRecord),
}

/// The part of `text` that fits the record buffer.
///
/// The cut never splits a UTF-8 sequence: when byte [`MAX_TEXT_LEN`] falls
/// inside a character, the whole character is left out.
pub fn truncate_text(text: &[u8]) -> &[u8] {
    if text.len() <= MAX_TEXT_LEN {
        return text;
    }
    let mut end = MAX_TEXT_LEN;
    // A character spans at most three continuation bytes.
    while end > MAX_TEXT_LEN - 3 && is_continuation(text[end]) {
        end -= 1;
    }
    &text[..end]
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Record text as a string of at most [`MAX_TEXT_LEN`] bytes.
///
/// An incomplete sequence at the end is dropped; other invalid bytes become
/// U+FFFD.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = match std::str::from_utf8(bytes) {
        Ok(text) => return text.to_owned(),
        Err(err) if err.error_len().is_none() => &bytes[..err.valid_up_to()],
        Err(_) => bytes,
    };
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.len() > MAX_TEXT_LEN {
        let mut end = MAX_TEXT_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

/// Encode a pulse.
///
/// ```text
/// ┌──────────┬──────────┬──────────────┐
/// │ Kind (1) │ Code (1) │ Value (4 LE) │
/// │ "P"      │ i8       │ i32          │
/// └──────────┴──────────┴──────────────┘
/// ```
pub fn encode_pulse(pulse: &Pulse, dst: &mut BytesMut) {
    dst.reserve(PULSE_SIZE);
    dst.put_u8(KIND_PULSE);
    dst.put_i8(pulse.code);
    dst.put_i32_le(pulse.value);
}

/// Encode a record, truncating `text` to at most [`MAX_TEXT_LEN`] bytes.
///
/// Returns the number of text bytes written.
///
/// ```text
/// ┌──────────┬──────────────┬──────────────────┬──────────┐
/// │ Kind (1) │ Severity (1) │ Text (≤5118)     │ NUL (1)  │
/// │ "R"      │              │                  │          │
/// └──────────┴──────────────┴──────────────────┴──────────┘
/// ```
pub fn encode_record(severity: Severity, text: &[u8], dst: &mut BytesMut) -> usize {
    let text = truncate_text(text);
    dst.reserve(3 + text.len());
    dst.put_u8(KIND_RECORD);
    dst.put_u8(severity.code());
    dst.put_slice(text);
    dst.put_u8(0);
    text.len()
}

/// Decode one datagram.
///
/// An empty datagram is a wake-up and decodes to [`Pulse::unblock`]. Record
/// text stops at the first NUL or at the end of the datagram, whichever comes
/// first, and never exceeds [`MAX_TEXT_LEN`] bytes.
pub fn decode_notification(datagram: &[u8]) -> Result<Notification> {
    if datagram.is_empty() {
        return Ok(Notification::Pulse(Pulse::unblock()));
    }
    if datagram.len() > MAX_DATAGRAM {
        return Err(FrameError::PayloadTooLarge {
            size: datagram.len(),
            max: MAX_DATAGRAM,
        });
    }

    let mut src = datagram;
    match src.get_u8() {
        KIND_PULSE => {
            if datagram.len() != PULSE_SIZE {
                return Err(FrameError::Malformed {
                    kind: "pulse",
                    len: datagram.len(),
                });
            }
            let code = src.get_i8();
            let value = src.get_i32_le();
            Ok(Notification::Pulse(Pulse { code, value }))
        }
        KIND_RECORD => {
            if src.is_empty() {
                return Err(FrameError::Malformed {
                    kind: "record",
                    len: datagram.len(),
                });
            }
            let severity = Severity::from_code(src.get_u8());
            let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
            let text = truncate_text(&src[..end]);
            Ok(Notification::Record(LogRecord {
                severity,
                text: decode_text(text),
            }))
        }
        other => Err(FrameError::UnknownKind(other)),
    }
}
