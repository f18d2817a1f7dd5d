//! Video Decoder boundary for Farview
//!
//! The hardware decoder itself is an external collaborator; this crate
//! defines the types crossing that boundary and a driver loop that feeds
//! a decoder from the video channel's event stream.

mod driver;
mod error;
mod traits;

pub use driver::*;
pub use error::*;
pub use traits::*;
