// Inbound payload -> ordered batch of container snapshots

use crate::models::ContainerSnapshot;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload is not JSON at all.
    #[error("malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Top level is JSON but neither an array nor an object.
    #[error("unexpected payload shape: expected array or object, got {0}")]
    UnexpectedShape(&'static str),

    /// One record in the batch could not be read as a snapshot.
    #[error("invalid record at index {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode one stream message into a batch, preserving wire order.
///
/// A top-level array yields one snapshot per element; a single top-level object is
/// a batch of one. Any error rejects the whole batch.
pub fn decode_batch(payload: &str) -> Result<Vec<ContainerSnapshot>, DecodeError> {
    let value: Value = serde_json::from_str(payload).map_err(DecodeError::Malformed)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| decode_record(index, item))
            .collect(),
        record @ Value::Object(_) => Ok(vec![decode_record(0, record)?]),
        other => Err(DecodeError::UnexpectedShape(json_kind(&other))),
    }
}

fn decode_record(index: usize, item: Value) -> Result<ContainerSnapshot, DecodeError> {
    if !item.is_object() {
        return Err(DecodeError::InvalidRecord {
            index,
            source: serde::de::Error::custom(format!(
                "expected object, got {}",
                json_kind(&item)
            )),
        });
    }
    serde_json::from_value(item).map_err(|source| DecodeError::InvalidRecord { index, source })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
