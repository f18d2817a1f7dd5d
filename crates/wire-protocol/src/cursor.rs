//! Control-channel cursor event codec
//!
//! Every control packet is a fixed 12 bytes, no payload:
//!
//! | offset | field                               |
//! |--------|-------------------------------------|
//! | 0      | version (always 1)                  |
//! | 1      | event type (0xA1/0xA2/0xA3)         |
//! | 2-5    | event sequence (u32 BE)             |
//! | 6-7    | cursor X (u16 BE, normalized*65535) |
//! | 8-9    | cursor Y (u16 BE, normalized*65535) |
//! | 10     | button id (0 for move)              |
//! | 11     | reserved (0)                        |

use crate::{CONTROL_PACKET_LEN, PROTOCOL_VERSION, ProtocolError, ProtocolResult};

const EVENT_MOVE: u8 = 0xA1;
const EVENT_BUTTON_UP: u8 = 0xA2;
const EVENT_BUTTON_DOWN: u8 = 0xA3;

/// Cursor position normalized to [0, 1] on both axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

impl CursorPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One pointer action captured by the viewer surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorEvent {
    Move { position: CursorPosition },
    ButtonDown { position: CursorPosition, button: u8 },
    ButtonUp { position: CursorPosition, button: u8 },
}

/// Scale a normalized axis to u16: round-half-up, clamped to [0, 65535]
fn scale_axis(value: f64) -> u16 {
    (value * 65535.0 + 0.5).floor().clamp(0.0, 65535.0) as u16
}

impl CursorEvent {
    pub fn position(&self) -> CursorPosition {
        match self {
            Self::Move { position }
            | Self::ButtonDown { position, .. }
            | Self::ButtonUp { position, .. } => *position,
        }
    }

    fn type_byte(&self) -> u8 {
        match self {
            Self::Move { .. } => EVENT_MOVE,
            Self::ButtonUp { .. } => EVENT_BUTTON_UP,
            Self::ButtonDown { .. } => EVENT_BUTTON_DOWN,
        }
    }

    fn button(&self) -> u8 {
        match self {
            Self::Move { .. } => 0,
            Self::ButtonDown { button, .. } | Self::ButtonUp { button, .. } => *button,
        }
    }

    /// Encode as a fixed-size control packet carrying `sequence`
    pub fn encode(&self, sequence: u32) -> [u8; CONTROL_PACKET_LEN] {
        let position = self.position();

        let mut packet = [0u8; CONTROL_PACKET_LEN];
        packet[0] = PROTOCOL_VERSION;
        packet[1] = self.type_byte();
        packet[2..6].copy_from_slice(&sequence.to_be_bytes());
        packet[6..8].copy_from_slice(&scale_axis(position.x).to_be_bytes());
        packet[8..10].copy_from_slice(&scale_axis(position.y).to_be_bytes());
        packet[10] = self.button();
        // byte 11 reserved, stays zero
        packet
    }

    /// Decode a control packet, returning the event sequence and the event
    pub fn decode(data: &[u8]) -> ProtocolResult<(u32, Self)> {
        if data.len() < CONTROL_PACKET_LEN {
            return Err(ProtocolError::PacketTooShort {
                len: data.len(),
                min: CONTROL_PACKET_LEN,
            });
        }

        let sequence = u32::from_be_bytes([data[2], data[3], data[4], data[5]]);
        let position = CursorPosition {
            x: f64::from(u16::from_be_bytes([data[6], data[7]])) / 65535.0,
            y: f64::from(u16::from_be_bytes([data[8], data[9]])) / 65535.0,
        };
        let button = data[10];

        let event = match data[1] {
            EVENT_MOVE => Self::Move { position },
            EVENT_BUTTON_UP => Self::ButtonUp { position, button },
            EVENT_BUTTON_DOWN => Self::ButtonDown { position, button },
            other => return Err(ProtocolError::UnknownEventType(other)),
        };

        Ok((sequence, event))
    }
}
