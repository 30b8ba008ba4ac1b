//! Reserved pulse codes.
//!
//! Codes below [`USER_CODE_START`] are reserved for built-in use.
//! Codes from [`USER_CODE_START`] to `i8::MAX` are available to applications.

/// Wake-up with no request attached. Sent to unblock a receiving thread.
pub const UNBLOCK: i8 = -1;

/// Ask the receiving server to stop.
pub const SHUTDOWN: i8 = 1;

/// First application-defined pulse code.
pub const USER_CODE_START: i8 = 16;

/// Returns a human-readable name for a pulse code.
pub fn pulse_name(code: i8) -> &'static str {
    match code {
        UNBLOCK => "UNBLOCK",
        SHUTDOWN => "SHUTDOWN",
        c if c < USER_CODE_START => "RESERVED",
        _ => "USER",
    }
}
