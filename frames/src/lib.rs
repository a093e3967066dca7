//! Shared stroke model, message types, and codecs for the whiteboard relay.
//!
//! This crate owns the wire representation used by both `relay` and the
//! client crates. Messages are closed serde enums; they travel either as
//! JSON text or inside a compact protobuf envelope whose payload is a
//! `google.protobuf.Value`.

pub mod message;
pub mod stroke;

use std::time::{SystemTime, UNIX_EPOCH};

use prost::Message as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use message::{ClientMessage, ServerMessage, UserRecord};
pub use stroke::{DEFAULT_PRESSURE, DrawingData, Point, PointMerge, StrokeStyle, Tool, merge_points};

/// Error returned by the encode/decode functions.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The JSON shape did not match any message variant.
    #[error("invalid message json: {0}")]
    Json(#[from] serde_json::Error),
    /// A serialized message had no `event` tag.
    #[error("message has no event tag")]
    MissingEvent,
}

/// Current time as milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// JSON
// =============================================================================

/// Serialize a message as JSON text.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn to_json<T: Serialize>(msg: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(msg)?)
}

/// Parse a message from JSON text.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON or an unknown event.
pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    Ok(serde_json::from_str(text)?)
}

// =============================================================================
// PROTOBUF
// =============================================================================

/// Encode a message into protobuf bytes.
///
/// # Errors
///
/// Returns [`CodecError::MissingEvent`] if the message does not serialize to
/// a tagged object, or [`CodecError::Json`] if serialization fails.
pub fn encode_message<T: Serialize>(msg: &T) -> Result<Vec<u8>, CodecError> {
    let value = serde_json::to_value(msg)?;
    let event = value
        .get("event")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingEvent)?
        .to_owned();
    let payload = value
        .get("payload")
        .filter(|v| !v.is_null())
        .map(json_to_proto_value);

    let wire = WireFrame { event, ts: now_ms(), payload };
    let mut out = Vec::with_capacity(wire.encoded_len());
    // Encoding into a growable Vec cannot run out of buffer.
    wire.encode(&mut out).unwrap_or_default();
    Ok(out)
}

/// Decode protobuf bytes into a message.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::Json`] when the event or payload does not match a variant.
pub fn decode_message<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    if wire.event.is_empty() {
        return Err(CodecError::MissingEvent);
    }

    let mut obj = Map::new();
    obj.insert("event".to_owned(), Value::String(wire.event));
    if let Some(payload) = wire.payload.as_ref().map(proto_to_json_value) {
        if !payload.is_null() {
            obj.insert("payload".to_owned(), payload);
        }
    }
    Ok(serde_json::from_value(Value::Object(obj))?)
}

fn json_to_proto_value(value: &Value) -> prost_types::Value {
    let kind = match value {
        Value::Null => prost_types::value::Kind::NullValue(prost_types::NullValue::NullValue as i32),
        Value::Bool(v) => prost_types::value::Kind::BoolValue(*v),
        Value::Number(v) => prost_types::value::Kind::NumberValue(v.as_f64().unwrap_or(0.0)),
        Value::String(v) => prost_types::value::Kind::StringValue(v.clone()),
        Value::Array(v) => prost_types::value::Kind::ListValue(prost_types::ListValue {
            values: v.iter().map(json_to_proto_value).collect(),
        }),
        Value::Object(v) => prost_types::value::Kind::StructValue(prost_types::Struct {
            fields: v
                .iter()
                .map(|(k, v)| (k.clone(), json_to_proto_value(v)))
                .collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

fn proto_to_json_value(value: &prost_types::Value) -> Value {
    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        prost_types::value::Kind::NullValue(_) => Value::Null,
        prost_types::value::Kind::NumberValue(v) => number_value(*v),
        prost_types::value::Kind::StringValue(v) => Value::String(v.clone()),
        prost_types::value::Kind::BoolValue(v) => Value::Bool(*v),
        prost_types::value::Kind::StructValue(v) => Value::Object(
            v.fields
                .iter()
                .map(|(k, v)| (k.clone(), proto_to_json_value(v)))
                .collect(),
        ),
        prost_types::value::Kind::ListValue(v) => Value::Array(v.values.iter().map(proto_to_json_value).collect()),
    }
}

/// Protobuf numbers are doubles; restore integers so integer fields
/// (timestamps, point counts) deserialize again.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::float_cmp)]
fn number_value(v: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if v.fract() == 0.0 && v.abs() <= MAX_EXACT {
        return Value::Number(serde_json::Number::from(v as i64));
    }
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

#[derive(Clone, PartialEq, prost::Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    event: String,
    #[prost(int64, tag = "2")]
    ts: i64,
    #[prost(message, optional, tag = "3")]
    payload: Option<prost_types::Value>,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
