use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::responses::{QuickwitRawResponse, RawResponse};
use super::{Backend, FetchBatch, FetchFailure, LogFetcher, QueryWindow, RetryPolicy};
use crate::app::ports::HttpClientPort;
use crate::config::QuickwitConfig;
use crate::error::Result;
use crate::observability::metrics;
use crate::types::LogSource;

/// Pooled search over several Quickwit sub-queries. A failing sub-query is
/// recorded in the batch and does not stop the others.
pub struct QuickwitFetcher {
    http: Arc<dyn HttpClientPort>,
    config: QuickwitConfig,
    retry: RetryPolicy,
}

impl QuickwitFetcher {
    pub fn new(http: Arc<dyn HttpClientPort>, config: QuickwitConfig, retry: RetryPolicy) -> Self {
        Self { http, config, retry }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/api/v1/{}/search",
            self.config.endpoint.trim_end_matches('/'),
            self.config.index
        )
    }

    /// Hit budget for each sub-query
    pub fn hits_per_query(&self, window: &QueryWindow) -> usize {
        let queries = self.config.queries.len().max(1);
        (window.limit / queries).max(1)
    }

    pub fn payload(&self, query: &str, window: &QueryWindow) -> Value {
        json!({
            "query": query,
            "max_hits": self.hits_per_query(window),
            "start_timestamp": window.start_secs(),
            "end_timestamp": window.end_secs(),
        })
    }

    async fn run_query(&self, url: &str, query: &str, window: &QueryWindow) -> Result<QuickwitRawResponse> {
        let payload = self.payload(query, window);
        let resp = self
            .retry
            .send(Backend::Quickwit, || self.http.post_json(url, &payload))
            .await?;
        QuickwitRawResponse::from_slice(&resp.bytes)
    }
}

#[async_trait]
impl LogFetcher for QuickwitFetcher {
    fn source(&self) -> LogSource {
        LogSource::Quickwit
    }

    fn describe_query(&self) -> String {
        self.config.queries.join(" OR ")
    }

    #[instrument(skip(self, window), fields(index = %self.config.index))]
    async fn fetch(&self, window: &QueryWindow) -> Result<FetchBatch> {
        let url = self.url();
        let mut batch = FetchBatch::default();

        for query in &self.config.queries {
            match self.run_query(&url, query, window).await {
                Ok(parsed) => {
                    info!("Quickwit query '{}' returned {} hits", query, parsed.hits().len());
                    batch.responses.push(RawResponse::Quickwit(parsed));
                }
                Err(e) => {
                    warn!("Error with query '{}': {}", query, e);
                    metrics::fetch::failure(Backend::Quickwit.as_str(), e.kind().as_str());
                    batch.failures.push(FetchFailure::new(Backend::Quickwit, query.as_str(), &e));
                }
            }
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::ReqwestHttp;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn fetcher(config: QuickwitConfig) -> QuickwitFetcher {
        let http = Arc::new(ReqwestHttp::new(Duration::from_secs(1)).unwrap());
        QuickwitFetcher::new(http, config, RetryPolicy::immediate(1))
    }

    #[test]
    fn test_search_url_and_payload() {
        let config = QuickwitConfig {
            endpoint: "http://quickwit:7280/".to_string(),
            ..Default::default()
        };
        let f = fetcher(config);
        assert_eq!(f.url(), "http://quickwit:7280/api/v1/otel-logs-v0_7/search");

        let end = Utc.timestamp_opt(1_700_007_200, 0).unwrap();
        let window = QueryWindow::ending_at(end, 2, 1000);
        let payload = f.payload("log_type:security", &window);
        assert_eq!(payload["query"], "log_type:security");
        assert_eq!(payload["max_hits"], 250);
        assert_eq!(payload["start_timestamp"], 1_700_000_000);
        assert_eq!(payload["end_timestamp"], 1_700_007_200);
        assert!(payload.get("sort_by").is_none());
    }

    #[test]
    fn test_hit_budget_never_zero() {
        let f = fetcher(QuickwitConfig::default());
        let window = QueryWindow::last_hours(1, 2);
        assert_eq!(f.hits_per_query(&window), 1);
    }
}
