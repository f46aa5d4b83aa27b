//! Codec for monitor-switch notifications.
//!
//! Wire format:
//! ```text
//! [monitor_id:1]
//! ```
//! One byte is one message. There is no header, length prefix, checksum or
//! version byte, so any peer that speaks this protocol reads exactly one byte
//! per switch and maps values `0..=MAX_MONITOR_ID` to F1..F11.

use thiserror::Error;

use crate::domain::layout::MonitorId;

/// Informational protocol revision. Never transmitted.
pub const PROTOCOL_VERSION: u8 = 1;

/// Default TCP port the broadcast server listens on.
pub const DEFAULT_PORT: u16 = 9876;

/// Highest monitor index the wire format carries (F1..F11).
pub const MAX_MONITOR_ID: u8 = 10;

/// Size in bytes of every message.
pub const MESSAGE_SIZE: usize = 1;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The monitor index lies outside `0..=MAX_MONITOR_ID`.
    #[error("monitor id must be 0-{max}, got {0}", max = MAX_MONITOR_ID)]
    OutOfRange(i64),

    /// The buffer is not exactly one message long.
    #[error("malformed message: expected {expected} byte(s), got {actual}")]
    MalformedMessage { expected: usize, actual: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a monitor index into its one-byte wire message.
///
/// Accepts any integer (or a [`MonitorId`]) so callers holding a wider or
/// signed index get a range error instead of a silent truncation.
///
/// # Errors
///
/// Returns [`ProtocolError::OutOfRange`] if `monitor_id` is negative or greater
/// than [`MAX_MONITOR_ID`].
///
/// # Examples
///
/// ```rust
/// use sunmonlok_core::protocol::{decode_monitor_switch, encode_monitor_switch};
///
/// let bytes = encode_monitor_switch(3).unwrap();
/// assert_eq!(bytes, [3]);
/// assert_eq!(decode_monitor_switch(&bytes).unwrap().get(), 3);
/// ```
pub fn encode_monitor_switch<T: Into<i64>>(monitor_id: T) -> Result<[u8; MESSAGE_SIZE], ProtocolError> {
    let raw = monitor_id.into();
    if !(0..=i64::from(MAX_MONITOR_ID)).contains(&raw) {
        return Err(ProtocolError::OutOfRange(raw));
    }
    Ok([raw as u8])
}

/// Decodes one monitor-switch message.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedMessage`] if `bytes` is not exactly
/// [`MESSAGE_SIZE`] long, and [`ProtocolError::OutOfRange`] if the value is
/// above [`MAX_MONITOR_ID`].
pub fn decode_monitor_switch(bytes: &[u8]) -> Result<MonitorId, ProtocolError> {
    if bytes.len() != MESSAGE_SIZE {
        return Err(ProtocolError::MalformedMessage {
            expected: MESSAGE_SIZE,
            actual: bytes.len(),
        });
    }

    let value = bytes[0];
    if value > MAX_MONITOR_ID {
        return Err(ProtocolError::OutOfRange(i64::from(value)));
    }
    Ok(MonitorId::new(value))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
