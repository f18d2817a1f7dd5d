//! Video channel error types

use thiserror::Error;
use wire_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum VideoChannelError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("video event channel closed")]
    ChannelClosed,
}

pub type VideoChannelResult<T> = Result<T, VideoChannelError>;
