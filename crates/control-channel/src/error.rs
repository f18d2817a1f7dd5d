//! Control channel error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlChannelError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

pub type ControlChannelResult<T> = Result<T, ControlChannelError>;
