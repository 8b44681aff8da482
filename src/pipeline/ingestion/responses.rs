//! Backend response shapes, one explicit type per backend.
//!
//! Every field is defaulted so that a schema drift on the backend side
//! shows up as empty data rather than a failed run. Entries inside the
//! collections stay loosely typed; the normalizers decide per record.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::Result;

/// Raw material for the normalizer, tagged by backend
#[derive(Debug, Clone)]
pub enum RawResponse {
    Loki(LokiRawResponse),
    Quickwit(QuickwitRawResponse),
}

/// `GET /loki/api/v1/query_range`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LokiRawResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<LokiData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LokiData {
    #[serde(default, rename = "resultType")]
    pub result_type: Option<String>,
    #[serde(default)]
    pub result: Option<Vec<LokiStream>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LokiStream {
    /// Labels shared by every value in the stream
    #[serde(default)]
    pub stream: Option<BTreeMap<String, Value>>,
    /// `[timestamp_ns_string, line]` pairs
    #[serde(default)]
    pub values: Option<Vec<Value>>,
}

impl LokiRawResponse {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn streams(&self) -> &[LokiStream] {
        self.data
            .as_ref()
            .and_then(|d| d.result.as_deref())
            .unwrap_or(&[])
    }
}

/// `POST /api/v1/{index}/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuickwitRawResponse {
    #[serde(default)]
    pub hits: Option<Vec<Value>>,
    #[serde(default)]
    pub num_hits: Option<u64>,
    #[serde(default)]
    pub elapsed_time_micros: Option<u64>,
}

impl QuickwitRawResponse {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn hits(&self) -> &[Value] {
        self.hits.as_deref().unwrap_or(&[])
    }
}

/// `GET /api/v1/query`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrometheusResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: Option<PrometheusData>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrometheusData {
    #[serde(default, rename = "resultType")]
    pub result_type: String,
    /// A list of series for vector/matrix, a single `[ts, value]` for scalar
    #[serde(default)]
    pub result: Value,
}

impl PrometheusResponse {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Flatten a JSON value into a label string: strings verbatim, everything else as JSON text
pub fn label_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// String view of an object member, ignoring empty strings and nulls
pub fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
