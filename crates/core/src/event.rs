//! Status events as delivered by the queue, and the records they become.
//!
//! The ingestor is schema-agnostic: only the [`TIMESTAMP_FIELD`] is read.
//! Everything else in an event is carried into the record untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StatusError;

/// Key holding the Unix timestamp on an inbound event, and the decoded
/// timestamp on the persisted record.
pub const TIMESTAMP_FIELD: &str = "ts";

/// Inbound status event: an arbitrary field map with a numeric `ts`.
pub type StatusEvent = Map<String, Value>;

/// A status event after timestamp decoding, ready to be persisted.
///
/// Serializes back to a flat map where `ts` is an RFC 3339 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub ts: DateTime<Utc>,

    /// Every other field of the event, unchanged.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StatusRecord {
    /// Decode the event's `ts` in place and take ownership of the remaining fields.
    pub fn from_event(mut event: StatusEvent) -> Result<Self, StatusError> {
        let raw = event
            .remove(TIMESTAMP_FIELD)
            .ok_or(StatusError::MissingTimestamp(TIMESTAMP_FIELD))?;
        let ts = decode_timestamp(&raw)?;
        Ok(Self { ts, fields: event })
    }

    /// Flat JSON view of the record, `ts` included.
    pub fn to_document(&self) -> Value {
        let mut doc = self.fields.clone();
        doc.insert(TIMESTAMP_FIELD.to_string(), Value::String(self.ts.to_rfc3339()));
        Value::Object(doc)
    }
}

/// Decode a Unix epoch value (whole or fractional seconds) into a UTC timestamp.
pub fn decode_timestamp(value: &Value) -> Result<DateTime<Utc>, StatusError> {
    let Value::Number(n) = value else {
        return Err(invalid(value, "not a number"));
    };

    if let Some(secs) = n.as_i64() {
        return DateTime::from_timestamp(secs, 0).ok_or_else(|| invalid(value, "out of range"));
    }
    if n.is_u64() {
        return Err(invalid(value, "out of range"));
    }

    let secs = n.as_f64().ok_or_else(|| invalid(value, "not a number"))?;
    if !secs.is_finite() || secs < i64::MIN as f64 || secs >= i64::MAX as f64 {
        return Err(invalid(value, "out of range"));
    }

    let mut whole = secs.floor();
    let mut nanos = ((secs - whole) * 1e9).round();
    if nanos >= 1e9 {
        whole += 1.0;
        nanos = 0.0;
    }

    DateTime::from_timestamp(whole as i64, nanos as u32)
        .ok_or_else(|| invalid(value, "out of range"))
}

fn invalid(value: &Value, reason: &str) -> StatusError {
    StatusError::InvalidTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
