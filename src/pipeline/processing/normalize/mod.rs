//! Backend responses to canonical log records.
//!
//! Normalization is pure and never fails: malformed entries fall back to
//! defaults (timestamp 0, empty message) instead of aborting the batch.

pub mod loki;
pub mod quickwit;

use serde_json::Value;
use tracing::debug;

use crate::observability::metrics;
use crate::pipeline::ingestion::responses::{label_value, str_field, RawResponse};
use crate::types::CanonicalLogRecord;

/// Embedded keys that would shadow canonical record fields
const RESERVED_KEYS: [&str; 5] = ["timestamp", "timestamp_ms", "timestamp_nanos", "source", "time"];

/// Normalize one backend response into records, in backend order
pub fn normalize_response(raw: &RawResponse) -> Vec<CanonicalLogRecord> {
    let records = match raw {
        RawResponse::Loki(resp) => loki::normalize(resp),
        RawResponse::Quickwit(resp) => quickwit::normalize(resp),
    };
    if let Some(first) = records.first() {
        metrics::normalize::records(first.source.as_str(), records.len());
    }
    records
}

/// Normalize a pooled batch, preserving response order
pub fn normalize_all(responses: &[RawResponse]) -> Vec<CanonicalLogRecord> {
    responses.iter().flat_map(normalize_response).collect()
}

/// Floor division, nanoseconds to milliseconds
pub fn nanos_to_millis(nanos: u64) -> u64 {
    nanos / 1_000_000
}

/// Nanosecond timestamp from a JSON string or number. Negative, fractional
/// garbage or missing values become 0.
pub fn parse_nanos(value: &Value) -> u64 {
    match value {
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// If the message is a JSON object, lift its members into the labels.
///
/// Existing labels win over embedded keys, reserved keys are dropped, and an
/// embedded `message`/`msg` string replaces the raw line. A top-level
/// `attributes` object is merged one level deep.
pub fn merge_embedded_json(record: &mut CanonicalLogRecord) {
    if !record.message.trim_start().starts_with('{') {
        return;
    }
    let map = match serde_json::from_str::<Value>(&record.message) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return,
        Err(e) => {
            debug!("message looks like JSON but did not parse: {}", e);
            return;
        }
    };

    let embedded_message = str_field(&map, "message")
        .or_else(|| str_field(&map, "msg"))
        .map(str::to_string);

    for (key, value) in &map {
        if RESERVED_KEYS.contains(&key.as_str()) || key == "message" || key == "msg" {
            continue;
        }
        if key == "attributes" {
            if let Some(attrs) = value.as_object() {
                for (attr_key, attr_value) in attrs {
                    if RESERVED_KEYS.contains(&attr_key.as_str()) {
                        continue;
                    }
                    record
                        .labels
                        .entry(attr_key.clone())
                        .or_insert_with(|| label_value(attr_value));
                }
                continue;
            }
        }
        record
            .labels
            .entry(key.clone())
            .or_insert_with(|| label_value(value));
    }

    if let Some(message) = embedded_message {
        record.message = message;
    }
}
