//! Protocol error types

use thiserror::Error;

/// Protocol error
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("packet too short: {len} bytes (min: {min})")]
    PacketTooShort { len: usize, min: usize },

    #[error("malformed parameter packet: {reason}")]
    MalformedParameterPacket { reason: String },

    #[error("missing fragment {index} of frame {frame_sequence}")]
    MissingFragment { index: u16, frame_sequence: u32 },

    #[error("unknown control event type: {0:#04x}")]
    UnknownEventType(u8),
}

/// Result type alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
