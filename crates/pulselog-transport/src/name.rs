use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TransportError};

/// A validated channel name.
///
/// Names are 1 to 64 characters drawn from `[A-Za-z0-9_-]`. The same name is
/// used by the server to register a channel and by clients to find it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    /// Maximum name length in characters.
    pub const MAX_LEN: usize = 64;

    /// Validate `name` and wrap it.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        match check(&name) {
            Ok(()) => Ok(Self(name)),
            Err(reason) => Err(TransportError::InvalidName { name, reason }),
        }
    }

    /// Returns true if `name` would be accepted by [`ChannelName::new`].
    pub fn is_valid(name: &str) -> bool {
        check(name).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check(name: &str) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name.chars().count() > ChannelName::MAX_LEN {
        return Err("name is longer than 64 characters");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err("name may only contain ASCII letters, digits, '_' and '-'");
    }
    Ok(())
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChannelName {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ChannelName {
    type Error = TransportError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = TransportError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}
