//! Wire codecs for [`DriverResult`].
//!
//! Three representations carry the same logical record:
//!
//! - **Binary**: exactly 32 bytes, four little-endian 8-byte fields in
//!   declared order, no padding. Byte-identical across implementations for
//!   identical field values.
//! - **JSON**: an object with the four fields by PascalCase name.
//! - **Text**: four space-separated tokens in field order
//!   (`value iteration create_timestamp read_timestamp`).
//!
//! Encoding is deterministic; decode-encode round trips are exact for the
//! integer fields. The text format only preserves the float value to the
//! precision of the literal it prints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{DriverResult, BINARY_FRAME_LEN};

/// Decode failures, all session-fatal for the consumer.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("truncated binary frame: expected {expected} bytes, got {got}")]
    TruncatedFrame { expected: usize, got: usize },

    #[error("invalid JSON record: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid text record: {0}")]
    InvalidToken(String),
}

/// One of the three wire representations.
///
/// The serde/Display names (`json`, `str`, `bin`) double as the format
/// argument of the pipe protocol's `r <format>` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "str")]
    Text,
    #[serde(rename = "bin")]
    Binary,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireFormat::Json => "json",
            WireFormat::Text => "str",
            WireFormat::Binary => "bin",
        };
        f.write_str(name)
    }
}

impl FromStr for WireFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(WireFormat::Json),
            "str" => Ok(WireFormat::Text),
            "bin" => Ok(WireFormat::Binary),
            other => Err(CodecError::InvalidToken(format!(
                "unknown wire format `{other}`"
            ))),
        }
    }
}

/// Encode a record in the given wire format.
///
/// JSON and text payloads carry no trailing newline; framing belongs to the
/// transport.
pub fn encode(record: &DriverResult, format: WireFormat) -> Vec<u8> {
    match format {
        WireFormat::Binary => {
            let mut buf = Vec::with_capacity(BINARY_FRAME_LEN);
            buf.extend_from_slice(&record.value.to_le_bytes());
            buf.extend_from_slice(&record.iteration.to_le_bytes());
            buf.extend_from_slice(&record.create_timestamp.to_le_bytes());
            buf.extend_from_slice(&record.read_timestamp.to_le_bytes());
            buf
        }
        WireFormat::Json => {
            // Serialization of a plain struct with numeric fields cannot fail.
            serde_json::to_vec(record).unwrap_or_default()
        }
        WireFormat::Text => format!(
            "{} {} {} {}",
            record.value, record.iteration, record.create_timestamp, record.read_timestamp
        )
        .into_bytes(),
    }
}

/// Decode a record from the given wire format.
pub fn decode(bytes: &[u8], format: WireFormat) -> Result<DriverResult, CodecError> {
    match format {
        WireFormat::Binary => decode_binary(bytes),
        WireFormat::Json => Ok(serde_json::from_slice(bytes)?),
        WireFormat::Text => decode_text(bytes),
    }
}

fn decode_binary(bytes: &[u8]) -> Result<DriverResult, CodecError> {
    if bytes.len() < BINARY_FRAME_LEN {
        return Err(CodecError::TruncatedFrame {
            expected: BINARY_FRAME_LEN,
            got: bytes.len(),
        });
    }

    let field = |i: usize| -> [u8; 8] {
        // Slice bounds checked above; the conversion cannot fail.
        bytes[i * 8..(i + 1) * 8].try_into().unwrap_or([0; 8])
    };

    Ok(DriverResult {
        value: f64::from_le_bytes(field(0)),
        iteration: i64::from_le_bytes(field(1)),
        create_timestamp: i64::from_le_bytes(field(2)),
        read_timestamp: i64::from_le_bytes(field(3)),
    })
}

fn decode_text(bytes: &[u8]) -> Result<DriverResult, CodecError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CodecError::InvalidToken(format!("not UTF-8: {e}")))?;
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 4 {
        return Err(CodecError::InvalidToken(format!(
            "expected 4 tokens, got {}",
            tokens.len()
        )));
    }

    let value: f64 = tokens[0]
        .parse()
        .map_err(|_| CodecError::InvalidToken(tokens[0].to_string()))?;
    let int_field = |tok: &str| -> Result<i64, CodecError> {
        tok.parse()
            .map_err(|_| CodecError::InvalidToken(tok.to_string()))
    };

    Ok(DriverResult {
        value,
        iteration: int_field(tokens[1])?,
        create_timestamp: int_field(tokens[2])?,
        read_timestamp: int_field(tokens[3])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DriverResult {
        DriverResult {
            value: 42.5,
            iteration: 7,
            create_timestamp: 1_700_000_000_000_000_001,
            read_timestamp: 1_700_000_000_000_000_999,
        }
    }

    #[test]
    fn test_binary_layout_is_32_little_endian_bytes() {
        let record = DriverResult {
            value: 1.5,
            iteration: 7,
            create_timestamp: 256,
            read_timestamp: -1,
        };
        let bytes = encode(&record, WireFormat::Binary);
        assert_eq!(bytes.len(), BINARY_FRAME_LEN);

        // 1.5f64 == 0x3FF8000000000000
        assert_eq!(&bytes[0..8], &[0, 0, 0, 0, 0, 0, 0xF8, 0x3F]);
        assert_eq!(&bytes[8..16], &[7, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[16..24], &[0, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[24..32], &[0xFF; 8]);
    }

    #[test]
    fn test_binary_round_trip() {
        let record = sample();
        let decoded = decode(&encode(&record, WireFormat::Binary), WireFormat::Binary).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_binary_truncated_frame() {
        let bytes = encode(&sample(), WireFormat::Binary);
        let err = decode(&bytes[..31], WireFormat::Binary).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedFrame {
                expected: 32,
                got: 31
            }
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let record = sample();
        let decoded = decode(&encode(&record, WireFormat::Json), WireFormat::Json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_json_missing_field_fails() {
        let err = decode(br#"{"Value":1.0,"Iteration":2}"#, WireFormat::Json).unwrap_err();
        assert!(matches!(err, CodecError::InvalidJson(_)));
    }

    #[test]
    fn test_json_mistyped_field_fails() {
        let err = decode(
            br#"{"Value":"high","Iteration":2,"CreateTimestamp":3,"ReadTimestamp":4}"#,
            WireFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::InvalidJson(_)));
    }

    #[test]
    fn test_text_round_trip_exact_integers() {
        let record = sample();
        let decoded = decode(&encode(&record, WireFormat::Text), WireFormat::Text).unwrap();
        // Integer fields are exact; the float must match within the printed
        // literal's precision.
        assert_eq!(decoded.iteration, record.iteration);
        assert_eq!(decoded.create_timestamp, record.create_timestamp);
        assert_eq!(decoded.read_timestamp, record.read_timestamp);
        assert!((decoded.value - record.value).abs() < 1e-9);
    }

    #[test]
    fn test_text_wrong_token_count() {
        assert!(matches!(
            decode(b"1.0 2 3", WireFormat::Text).unwrap_err(),
            CodecError::InvalidToken(_)
        ));
        assert!(matches!(
            decode(b"1.0 2 3 4 5", WireFormat::Text).unwrap_err(),
            CodecError::InvalidToken(_)
        ));
    }

    #[test]
    fn test_text_bad_numeric_token() {
        let err = decode(b"1.0 two 3 4", WireFormat::Text).unwrap_err();
        assert!(matches!(err, CodecError::InvalidToken(ref t) if t == "two"));
    }

    #[test]
    fn test_wire_format_names() {
        for (name, format) in [
            ("json", WireFormat::Json),
            ("str", WireFormat::Text),
            ("bin", WireFormat::Binary),
        ] {
            assert_eq!(name.parse::<WireFormat>().unwrap(), format);
            assert_eq!(format.to_string(), name);
        }
        assert!("xml".parse::<WireFormat>().is_err());
    }
}
