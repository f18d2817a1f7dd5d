//! Video-channel packet header codec

use crate::{PROTOCOL_VERSION, ProtocolError, ProtocolResult, VIDEO_HEADER_LEN};

/// Kind of an inbound video-channel packet, decoded from byte 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// Encoded video frame data, or one fragment of a frame
    Frame,
    /// Codec parameter sets for decoder initialization
    Parameters,
    /// Unrecognized type byte, ignored as a forward-compatible no-op
    Unknown(u8),
}

impl PacketKind {
    pub const FRAME: u8 = 0x01;
    pub const PARAMETERS: u8 = 0x02;

    pub fn from_byte(value: u8) -> Self {
        match value {
            Self::FRAME => Self::Frame,
            Self::PARAMETERS => Self::Parameters,
            other => Self::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Frame => Self::FRAME,
            Self::Parameters => Self::PARAMETERS,
            Self::Unknown(other) => other,
        }
    }
}

/// Video packet header
///
/// Wire layout, all multi-byte fields big-endian:
///
/// | offset | field                           |
/// |--------|---------------------------------|
/// | 0      | version (always 1)              |
/// | 1      | packet type                     |
/// | 2-3    | fragment index (0 when whole)   |
/// | 4-5    | fragment total (0 = whole)      |
/// | 6-9    | frame sequence                  |
/// | 10..   | payload                         |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoHeader {
    pub kind: PacketKind,
    /// Fragment index within this frame (0 when unfragmented)
    pub fragment_index: u16,
    /// Total fragments in this frame (0 = not fragmented)
    pub fragment_total: u16,
    /// Monotonically increasing frame identifier assigned by the sender
    pub frame_sequence: u32,
}

impl VideoHeader {
    /// Encode into the wire layout
    pub fn encode(&self) -> [u8; VIDEO_HEADER_LEN] {
        let mut header = [0u8; VIDEO_HEADER_LEN];
        header[0] = PROTOCOL_VERSION;
        header[1] = self.kind.to_byte();
        header[2..4].copy_from_slice(&self.fragment_index.to_be_bytes());
        header[4..6].copy_from_slice(&self.fragment_total.to_be_bytes());
        header[6..10].copy_from_slice(&self.frame_sequence.to_be_bytes());
        header
    }

    /// Decode a datagram, returning the header and the payload slice
    pub fn decode(data: &[u8]) -> ProtocolResult<(Self, &[u8])> {
        if data.len() < VIDEO_HEADER_LEN {
            return Err(ProtocolError::PacketTooShort {
                len: data.len(),
                min: VIDEO_HEADER_LEN,
            });
        }

        let header = Self {
            kind: PacketKind::from_byte(data[1]),
            fragment_index: u16::from_be_bytes([data[2], data[3]]),
            fragment_total: u16::from_be_bytes([data[4], data[5]]),
            frame_sequence: u32::from_be_bytes([data[6], data[7], data[8], data[9]]),
        };

        Ok((header, &data[VIDEO_HEADER_LEN..]))
    }
}
