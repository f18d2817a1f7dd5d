//! Decoder trait abstraction

use bytes::Bytes;

use crate::DecoderResult;

/// Format description built from the sender's codec parameter sets
#[derive(Debug, Clone)]
pub struct FormatDescription {
    /// Raw parameter sets (e.g. HEVC VPS/SPS/PPS), in sender order
    pub parameter_sets: Vec<Bytes>,
    /// NAL-unit header length in bytes
    pub nal_unit_header_length: u8,
}

impl FormatDescription {
    pub fn new(parameter_sets: Vec<Bytes>, nal_unit_header_length: u8) -> Self {
        Self {
            parameter_sets,
            nal_unit_header_length,
        }
    }
}

/// A decoded frame ready for display
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Pixel data in the decoder's output format
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Video decoder trait
pub trait VideoDecoder: Send {
    /// Initialize (or reinitialize) the decoder from a format description
    fn initialize(&mut self, format: FormatDescription) -> DecoderResult<()>;

    /// Decode one complete encoded frame
    fn submit(&mut self, frame: Bytes) -> DecoderResult<DecodedImage>;
}

/// Message emitted by the video channel toward the decoder
#[derive(Debug, Clone)]
pub enum VideoEvent {
    /// Codec parameters arrived; (re)initialize the decoder
    FormatDescription(FormatDescription),
    /// A fully reassembled encoded frame
    EncodedFrame(Bytes),
}
