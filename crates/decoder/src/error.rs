//! Decoder error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("decoder initialization failed: {0}")]
    InitFailed(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("decoder not initialized")]
    NotInitialized,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type DecoderResult<T> = Result<T, DecoderError>;
