use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use super::responses::{LokiRawResponse, RawResponse};
use super::{Backend, FetchBatch, LogFetcher, QueryWindow, RetryPolicy};
use crate::app::ports::HttpClientPort;
use crate::config::LokiConfig;
use crate::constants::LOKI_QUERY_RANGE_PATH;
use crate::error::{LoaderError, Result};
use crate::types::LogSource;

/// Range query against Loki, newest entries first
pub struct LokiFetcher {
    http: Arc<dyn HttpClientPort>,
    config: LokiConfig,
    retry: RetryPolicy,
}

impl LokiFetcher {
    pub fn new(http: Arc<dyn HttpClientPort>, config: LokiConfig, retry: RetryPolicy) -> Self {
        Self { http, config, retry }
    }

    pub fn url(&self) -> String {
        format!(
            "{}{}",
            self.config.endpoint.trim_end_matches('/'),
            LOKI_QUERY_RANGE_PATH
        )
    }

    pub fn query_params(&self, window: &QueryWindow) -> Vec<(String, String)> {
        vec![
            ("query".to_string(), self.config.query.clone()),
            ("start".to_string(), window.start_nanos().to_string()),
            ("end".to_string(), window.end_nanos().to_string()),
            ("limit".to_string(), window.limit.to_string()),
            ("direction".to_string(), "backward".to_string()),
        ]
    }
}

#[async_trait]
impl LogFetcher for LokiFetcher {
    fn source(&self) -> LogSource {
        LogSource::Loki
    }

    fn describe_query(&self) -> String {
        self.config.query.clone()
    }

    #[instrument(skip(self, window), fields(query = %self.config.query))]
    async fn fetch(&self, window: &QueryWindow) -> Result<FetchBatch> {
        let url = self.url();
        let params = self.query_params(window);

        let resp = self
            .retry
            .send(Backend::Loki, || self.http.get(&url, &params))
            .await?;
        let parsed = LokiRawResponse::from_slice(&resp.bytes)?;

        if parsed.status.as_deref() == Some("error") {
            return Err(LoaderError::Backend {
                backend: Backend::Loki.as_str().to_string(),
                message: "query_range returned status=error".to_string(),
            });
        }

        info!("Fetched {} streams from Loki", parsed.streams().len());
        Ok(FetchBatch {
            responses: vec![RawResponse::Loki(parsed)],
            failures: Vec::new(),
        })
    }
}
