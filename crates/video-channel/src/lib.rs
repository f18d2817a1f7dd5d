//! Video Channel - inbound frame transport for Farview
//!
//! Listens for encoded video frames on a UDP socket, reassembles
//! fragmented frames, and forwards complete frames and format
//! descriptions to the decoder boundary.

mod error;
mod reassembly;
mod receiver;

pub use error::*;
pub use reassembly::*;
pub use receiver::*;
