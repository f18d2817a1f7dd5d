//! Control Channel - outbound pointer events for Farview
//!
//! Carries pointer and button events from the local viewer back to the
//! remote host over a dedicated datagram socket.

mod error;
mod sender;

pub use error::*;
pub use sender::*;
