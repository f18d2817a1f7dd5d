//! Control channel sender
//!
//! Encodes pointer events as fixed 12-byte packets and fires them at the
//! remote host. Sending never blocks the input-dispatch path and never
//! fails it; a transport error is logged and the event dropped.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wire_protocol::{CursorEvent, CursorPosition};

use crate::ControlChannelResult;

/// Outbound encoder for the control channel
pub struct ControlSender {
    socket: UdpSocket,
    sequence: u32,
}

impl ControlSender {
    /// Bind an ephemeral local socket connected to the remote control
    /// endpoint
    pub async fn connect(remote: SocketAddr) -> ControlChannelResult<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.connect(remote).await?;
        info!(%remote, "control channel connected");

        Ok(Self {
            socket,
            sequence: 0,
        })
    }

    /// Sequence number the next packet will carry. The counter wraps at
    /// u32::MAX and is never reset while the sender is alive.
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    pub fn send_move(&mut self, position: CursorPosition) {
        self.send(&CursorEvent::Move { position });
    }

    pub fn send_button_down(&mut self, position: CursorPosition, button: u8) {
        self.send(&CursorEvent::ButtonDown { position, button });
    }

    pub fn send_button_up(&mut self, position: CursorPosition, button: u8) {
        self.send(&CursorEvent::ButtonUp { position, button });
    }

    /// Encode and transmit one event, consuming one sequence number.
    /// Fire-and-forget: a failed send is logged, never surfaced.
    pub fn send(&mut self, event: &CursorEvent) {
        let packet = event.encode(self.sequence);
        self.sequence = self.sequence.wrapping_add(1);

        if let Err(e) = self.socket.try_send(&packet) {
            warn!(error = %e, "control send failed, dropping event");
        }
    }
}

/// Consume a typed cursor event stream, transmitting each event in
/// arrival order. Returns when the producing side closes the stream.
pub async fn pump_cursor_events(mut events: mpsc::Receiver<CursorEvent>, mut sender: ControlSender) {
    while let Some(event) = events.recv().await {
        sender.send(&event);
    }
    debug!("cursor event stream ended");
}
