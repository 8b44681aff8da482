use serde_json::{Map, Value};

use super::{merge_embedded_json, nanos_to_millis, parse_nanos};
use crate::pipeline::ingestion::responses::{label_value, str_field, QuickwitRawResponse};
use crate::types::{CanonicalLogRecord, LogSource, SecurityFields};

/// Top-level document fields copied into labels verbatim
const DOCUMENT_LABELS: [&str; 5] = ["service_name", "severity_text", "trace_id", "span_id", "scope_name"];

pub fn normalize(resp: &QuickwitRawResponse) -> Vec<CanonicalLogRecord> {
    resp.hits().iter().map(normalize_hit).collect()
}

/// A hit is either `{"document": {...}}` or the document itself
pub fn normalize_hit(hit: &Value) -> CanonicalLogRecord {
    let empty = Map::new();
    let doc = hit
        .get("document")
        .and_then(Value::as_object)
        .or_else(|| hit.as_object())
        .unwrap_or(&empty);

    let timestamp_ns = doc.get("timestamp_nanos").map(parse_nanos).unwrap_or(0);
    let message = doc.get("body").map(body_message).unwrap_or_default();
    let mut record = CanonicalLogRecord::new(nanos_to_millis(timestamp_ns), message, LogSource::Quickwit);

    for key in DOCUMENT_LABELS {
        if let Some(value) = doc.get(key).filter(|v| !v.is_null()) {
            record.labels.insert(key.to_string(), label_value(value));
        }
    }

    let attrs = doc.get("attributes").and_then(Value::as_object).unwrap_or(&empty);
    for (key, value) in attrs {
        record
            .labels
            .entry(key.clone())
            .or_insert_with(|| label_value(value));
    }

    if let Some(resource) = doc.get("resource_attributes").and_then(Value::as_object) {
        for (key, value) in resource {
            record
                .labels
                .insert(format!("resource.{}", key), label_value(value));
        }
    }

    let security = security_fields(attrs);
    if !security.is_empty() {
        record.security = Some(security);
    }

    merge_embedded_json(&mut record);
    record
}

/// Body is a plain string or an object carrying `message`
fn body_message(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        Value::Object(map) => str_field(map, "message")
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// First present, non-empty attribute among `keys`
fn first_attr(attrs: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| attrs.get(*key))
        .filter(|v| !v.is_null())
        .map(label_value)
        .find(|v| !v.is_empty())
}

fn security_fields(attrs: &Map<String, Value>) -> SecurityFields {
    SecurityFields {
        user_id: first_attr(attrs, &["user_id", "user"]),
        source_ip: first_attr(attrs, &["source_ip", "client_ip", "remote_addr"]),
        user_agent: first_attr(attrs, &["user_agent", "http_user_agent"]),
        http_method: first_attr(attrs, &["http_method", "method"]),
        http_status: first_attr(attrs, &["http_status", "status_code"]),
        url: first_attr(attrs, &["url", "request_uri"]),
        session_id: first_attr(attrs, &["session_id"]),
        event_type: first_attr(attrs, &["event_type"]),
        attack_type: first_attr(attrs, &["attack_type"]),
        threat_level: first_attr(attrs, &["threat_level"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_hit() {
        let hit = json!({
            "document": {
                "timestamp_nanos": 1_700_000_123_456_789_000u64,
                "body": "Failed login for admin",
                "severity_text": "WARN",
                "service_name": "auth-svc",
                "trace_id": "abc",
                "attributes": {
                    "log_type": "security",
                    "client_ip": "203.0.113.9",
                    "user": "admin",
                    "status_code": 401
                },
                "resource_attributes": {"host.name": "node-1"}
            }
        });

        let record = normalize_hit(&hit);
        assert_eq!(record.source, LogSource::Quickwit);
        assert_eq!(record.timestamp_ms, 1_700_000_123_456);
        assert_eq!(record.message, "Failed login for admin");
        assert_eq!(record.service_name(), "auth-svc");
        assert_eq!(record.labels["severity_text"], "WARN");
        assert_eq!(record.labels["log_type"], "security");
        assert_eq!(record.labels["resource.host.name"], "node-1");

        let security = record.security.unwrap();
        assert_eq!(security.source_ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(security.user_id.as_deref(), Some("admin"));
        assert_eq!(security.http_status.as_deref(), Some("401"));
        assert_eq!(security.url, None);
    }

    #[test]
    fn test_inline_hit_with_object_body() {
        let hit = json!({
            "timestamp_nanos": "2000000",
            "body": {"message": "firewall dropped packet"},
            "attributes": {"source_ip": "", "remote_addr": "10.1.1.1"}
        });

        let record = normalize_hit(&hit);
        assert_eq!(record.timestamp_ms, 2);
        assert_eq!(record.message, "firewall dropped packet");
        assert_eq!(record.source_ip(), Some("10.1.1.1"));
    }

    #[test]
    fn test_missing_fields_default() {
        let record = normalize_hit(&json!({}));
        assert_eq!(record.timestamp_ms, 0);
        assert_eq!(record.message, "");
        assert!(record.security.is_none());
        assert_eq!(record.service_name(), "unknown");
    }

    #[test]
    fn test_empty_hits() {
        let resp = QuickwitRawResponse::from_slice(br#"{"hits": []}"#).unwrap();
        assert!(normalize(&resp).is_empty());
    }
}
