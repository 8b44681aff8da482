use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::responses::PrometheusResponse;
use super::{Backend, RetryPolicy};
use crate::app::ports::HttpClientPort;
use crate::config::PrometheusConfig;
use crate::constants::PROMETHEUS_QUERY_PATH;
use crate::error::{LoaderError, Result};

/// Instant queries against the Prometheus HTTP API
pub struct PrometheusClient {
    http: Arc<dyn HttpClientPort>,
    config: PrometheusConfig,
    retry: RetryPolicy,
}

impl PrometheusClient {
    pub fn new(http: Arc<dyn HttpClientPort>, config: PrometheusConfig, retry: RetryPolicy) -> Self {
        Self { http, config, retry }
    }

    pub fn url(&self) -> String {
        format!(
            "{}{}",
            self.config.endpoint.trim_end_matches('/'),
            PROMETHEUS_QUERY_PATH
        )
    }

    pub async fn instant_query(&self, query: &str, at: DateTime<Utc>) -> Result<PrometheusResponse> {
        let url = self.url();
        let params = vec![
            ("query".to_string(), query.to_string()),
            ("time".to_string(), at.timestamp().to_string()),
        ];
        let resp = self
            .retry
            .send(Backend::Prometheus, || self.http.get(&url, &params))
            .await?;
        PrometheusResponse::from_slice(&resp.bytes)
    }

    /// Single numeric value of a query; `Ok(None)` when the query matched nothing
    pub async fn query_value(&self, query: &str, at: DateTime<Utc>) -> Result<Option<f64>> {
        let resp = self.instant_query(query, at).await?;
        if !resp.is_success() {
            return Err(LoaderError::Backend {
                backend: Backend::Prometheus.as_str().to_string(),
                message: resp
                    .error
                    .unwrap_or_else(|| format!("query status '{}'", resp.status)),
            });
        }
        let value = extract_value(&resp);
        debug!("Prometheus query '{}' -> {:?}", query, value);
        Ok(value)
    }
}

/// Vector: first sample. Matrix: last sample of the first series. Scalar: its value.
pub fn extract_value(resp: &PrometheusResponse) -> Option<f64> {
    if !resp.is_success() {
        return None;
    }
    let data = resp.data.as_ref()?;
    let sample = match data.result_type.as_str() {
        "vector" => data.result.get(0)?.get("value")?,
        "matrix" => data.result.get(0)?.get("values")?.as_array()?.last()?,
        "scalar" => &data.result,
        _ => return None,
    };
    sample_value(sample)
}

/// `[timestamp, "value"]` to a finite float
fn sample_value(sample: &Value) -> Option<f64> {
    let raw = sample.get(1)?;
    let value = match raw {
        Value::String(s) => s.parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> PrometheusResponse {
        PrometheusResponse::from_slice(body.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_vector_value() {
        let resp = parse(json!({
            "status": "success",
            "data": {"resultType": "vector", "result": [{"metric": {}, "value": [1700000000.0, "42.5"]}]}
        }));
        assert_eq!(extract_value(&resp), Some(42.5));
    }

    #[test]
    fn test_matrix_takes_latest_value() {
        let resp = parse(json!({
            "status": "success",
            "data": {"resultType": "matrix", "result": [{"metric": {}, "values": [[1, "1"], [2, "2"], [3, "3.5"]]}]}
        }));
        assert_eq!(extract_value(&resp), Some(3.5));
    }

    #[test]
    fn test_scalar_value() {
        let resp = parse(json!({
            "status": "success",
            "data": {"resultType": "scalar", "result": [1700000000.0, "7"]}
        }));
        assert_eq!(extract_value(&resp), Some(7.0));
    }

    #[test]
    fn test_empty_or_failed_results() {
        let empty = parse(json!({"status": "success", "data": {"resultType": "vector", "result": []}}));
        assert_eq!(extract_value(&empty), None);

        let failed = parse(json!({"status": "error", "errorType": "bad_data", "error": "parse error"}));
        assert_eq!(extract_value(&failed), None);

        let nan = parse(json!({
            "status": "success",
            "data": {"resultType": "vector", "result": [{"value": [1, "NaN"]}]}
        }));
        assert_eq!(extract_value(&nan), None);

        let garbage = parse(json!({
            "status": "success",
            "data": {"resultType": "vector", "result": [{"value": [1, "n/a"]}]}
        }));
        assert_eq!(extract_value(&garbage), None);
    }
}
