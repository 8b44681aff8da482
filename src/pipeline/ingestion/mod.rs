// Pipeline ingestion: time windows, retrying transport and per-backend fetchers

pub mod loki;
pub mod prometheus;
pub mod quickwit;
pub mod responses;
pub mod retry;
pub mod window;

use async_trait::async_trait;

use crate::error::{ErrorKind, LoaderError, Result};
use crate::types::LogSource;
use responses::RawResponse;

pub use loki::LokiFetcher;
pub use prometheus::PrometheusClient;
pub use quickwit::QuickwitFetcher;
pub use retry::RetryPolicy;
pub use window::QueryWindow;

/// HTTP backends the loaders talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Loki,
    Quickwit,
    Prometheus,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Loki => "loki",
            Backend::Quickwit => "quickwit",
            Backend::Prometheus => "prometheus",
        }
    }
}

impl From<LogSource> for Backend {
    fn from(source: LogSource) -> Self {
        match source {
            LogSource::Loki => Backend::Loki,
            LogSource::Quickwit => Backend::Quickwit,
        }
    }
}

/// One query that could not be answered
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub backend: Backend,
    pub query: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl FetchFailure {
    pub fn new(backend: Backend, query: impl Into<String>, error: &LoaderError) -> Self {
        Self {
            backend,
            query: query.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Raw responses pooled from one or more queries, plus the queries that failed
#[derive(Debug, Default)]
pub struct FetchBatch {
    pub responses: Vec<RawResponse>,
    pub failures: Vec<FetchFailure>,
}

/// A log backend queried over a time window
#[async_trait]
pub trait LogFetcher: Send + Sync {
    fn source(&self) -> LogSource;

    /// Query text used when reporting a failed run
    fn describe_query(&self) -> String;

    async fn fetch(&self, window: &QueryWindow) -> Result<FetchBatch>;
}
