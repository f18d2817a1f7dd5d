//! Parameter payload parsing
//!
//! A parameters packet carries a JSON array of codec parameter-set records
//! (e.g. HEVC VPS/SPS/PPS), each base64-encoded with a declared byte size.
//! The decoded sets are handed to the decoder boundary in sender order.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::Deserialize;

use crate::{ProtocolError, ProtocolResult};

/// NAL-unit header length handed to the decoder with every format description
pub const NAL_UNIT_HEADER_LENGTH: u8 = 4;

/// One record of the parameters payload. The wire JSON also carries a
/// `parameterSetCount` field the receiving side has no use for.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParameterSetRecord {
    parameter_data_base64: String,
    parameter_data_size_in_bytes: usize,
}

/// Parse a parameters payload into raw parameter-set byte sequences, in
/// the order the sender declared them.
///
/// Any malformed record fails the whole payload; nothing partial is
/// returned.
pub fn parse_parameter_sets(payload: &[u8]) -> ProtocolResult<Vec<Bytes>> {
    let records: Vec<ParameterSetRecord> = serde_json::from_slice(payload).map_err(|e| {
        ProtocolError::MalformedParameterPacket {
            reason: e.to_string(),
        }
    })?;

    let mut sets = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let data = BASE64.decode(&record.parameter_data_base64).map_err(|e| {
            ProtocolError::MalformedParameterPacket {
                reason: format!("record {index}: invalid base64: {e}"),
            }
        })?;

        if data.len() != record.parameter_data_size_in_bytes {
            return Err(ProtocolError::MalformedParameterPacket {
                reason: format!(
                    "record {index}: declared {} bytes, decoded {}",
                    record.parameter_data_size_in_bytes,
                    data.len()
                ),
            });
        }

        sets.push(Bytes::from(data));
    }

    Ok(sets)
}
