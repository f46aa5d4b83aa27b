//! Protocol module containing the single-byte monitor-switch codec.

pub mod codec;

pub use codec::{
    decode_monitor_switch, encode_monitor_switch, ProtocolError, DEFAULT_PORT, MAX_MONITOR_ID,
    MESSAGE_SIZE, PROTOCOL_VERSION,
};
