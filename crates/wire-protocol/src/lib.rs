//! Shared Wire Protocol Definitions for Farview
//!
//! This crate contains the packet header codecs, cursor event encoding,
//! and parameter payload parsing shared by both transport channels.

mod cursor;
mod error;
mod header;
mod params;

pub use cursor::*;
pub use error::*;
pub use header::*;
pub use params::*;

/// Protocol version carried in byte 0 of every packet
pub const PROTOCOL_VERSION: u8 = 1;

/// Header length of a video-channel packet; the payload starts here.
/// Shorter datagrams are rejected before reaching a handler.
pub const VIDEO_HEADER_LEN: usize = 10;

/// Fixed size of a control-channel packet (header only, no payload)
pub const CONTROL_PACKET_LEN: usize = 12;

/// Largest datagram either channel will ever see
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// UDP port the video channel listens on in the reference deployment.
/// The channel crates take explicit addresses; this exists for the
/// process-wiring layer that chooses them.
pub const VIDEO_PORT: u16 = 5004;

/// UDP port the control channel sends to in the reference deployment.
/// Exported for the process-wiring layer, like [`VIDEO_PORT`].
pub const CONTROL_PORT: u16 = 5005;
