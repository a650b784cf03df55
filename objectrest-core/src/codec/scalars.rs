//! Scalar adapters for the wire formats the peer uses.

use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Timelike};
use num_bigint::{BigInt, ToBigInt};
use serde_json::Value;

use crate::error::CodecError;

/// Encode a date-time at second precision, e.g. `1984-02-25T20:15:25-06:00`.
pub fn encode_date_time(value: &DateTime<FixedOffset>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Decode an ISO-8601 date-time.
///
/// The peer sends anywhere from zero to six fractional digits; the parsed
/// value is normalized to millisecond precision — zero-padded below three
/// digits, truncated above.
pub fn decode_date_time(text: &str) -> Result<DateTime<FixedOffset>, CodecError> {
    let parsed = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z")
        .map_err(|e| CodecError::Scalar(format!("invalid date-time {text:?}: {e}")))?;
    let millis = parsed.timestamp_subsec_nanos() / 1_000_000;
    parsed
        .with_nanosecond(millis * 1_000_000)
        .ok_or_else(|| CodecError::Scalar(format!("invalid date-time {text:?}")))
}

/// Encode a big integer as a bare numeral.
pub fn encode_big_integer(value: &BigInt) -> Result<Value, CodecError> {
    let number = serde_json::Number::from_str(&value.to_string())
        .map_err(|e| CodecError::Encode(format!("big integer {value} is not a JSON number: {e}")))?;
    Ok(Value::Number(number))
}

/// Decode a big integer through an arbitrary-precision decimal parse.
///
/// The peer occasionally sends exponent notation for large values; the
/// decimal parse tolerates it, and the result is truncated to its integral
/// part.
pub fn decode_big_integer(value: &Value) -> Result<BigInt, CodecError> {
    let Value::Number(number) = value else {
        return Err(CodecError::Scalar(format!(
            "expected a number for a big integer, got {value}"
        )));
    };
    let decimal = BigDecimal::from_str(&number.to_string())
        .map_err(|e| CodecError::Scalar(format!("invalid big integer {number}: {e}")))?;
    decimal
        .to_bigint()
        .ok_or_else(|| CodecError::Scalar(format!("invalid big integer {number}")))
}

/// Encode a binary blob as base64 text.
pub fn encode_binary(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode a base64 blob.
pub fn decode_binary(text: &str) -> Result<Bytes, CodecError> {
    BASE64
        .decode(text)
        .map(Bytes::from)
        .map_err(|e| CodecError::Scalar(format!("invalid base64: {e}")))
}
