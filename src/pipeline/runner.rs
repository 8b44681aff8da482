use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ScoringWeights;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::emit::DashboardDocument;
use crate::pipeline::ingestion::{Backend, FetchFailure, LogFetcher, QueryWindow};
use crate::pipeline::processing::dedup::dedup_and_sort;
use crate::pipeline::processing::enrich::{DefaultEnricher, Enricher, EnrichmentProfile, HourClock};
use crate::pipeline::processing::normalize::normalize_all;
use crate::pipeline::processing::summary::summarize;
use crate::pipeline::system_metrics::MetricsCollector;

/// Outcome of one log run. `document` is always emittable.
#[derive(Debug)]
pub struct PipelineRun {
    pub document: DashboardDocument,
    pub failures: Vec<FetchFailure>,
}

impl PipelineRun {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// fetch, normalize, enrich, dedup/sort, summarize
pub struct LogPipeline {
    fetcher: Box<dyn LogFetcher>,
    enricher: DefaultEnricher,
    max_logs: usize,
    health: Option<MetricsCollector>,
}

impl LogPipeline {
    pub fn new(
        fetcher: Box<dyn LogFetcher>,
        weights: ScoringWeights,
        clock: HourClock,
        max_logs: usize,
    ) -> Self {
        let profile = EnrichmentProfile::from(fetcher.source());
        Self {
            fetcher,
            enricher: DefaultEnricher::new(profile, weights, clock),
            max_logs,
            health: None,
        }
    }

    /// Attach health indicators from a Prometheus snapshot to the summary
    pub fn with_health(mut self, collector: MetricsCollector) -> Self {
        self.health = Some(collector);
        self
    }

    pub fn profile(&self) -> EnrichmentProfile {
        self.enricher.profile
    }

    /// Run once. Any error degrades to an empty document.
    pub async fn run(&self, window: &QueryWindow) -> PipelineRun {
        let backend = Backend::from(self.fetcher.source());
        let run_id = Uuid::new_v4();
        let span = info_span!("run", backend = backend.as_str(), run_id = %run_id);

        async {
            let started = Instant::now();
            let mut run = match self.try_run(window).await {
                Ok(run) => run,
                Err(e) => {
                    error!(kind = e.kind().as_str(), "Run degraded to empty output: {}", e);
                    metrics::fetch::failure(backend.as_str(), e.kind().as_str());
                    PipelineRun {
                        document: DashboardDocument::empty(self.profile()),
                        failures: vec![FetchFailure::new(backend, self.fetcher.describe_query(), &e)],
                    }
                }
            };

            if let Some(collector) = &self.health {
                let (health, failures) = collector.health().await;
                run.document.summary.health = Some(health);
                run.failures.extend(failures);
            }

            metrics::run::completed(
                backend.as_str(),
                run.document.logs.len(),
                started.elapsed().as_secs_f64(),
            );
            if run.is_degraded() {
                warn!(failures = run.failures.len(), "Run finished with failed queries");
            }
            run
        }
        .instrument(span)
        .await
    }

    async fn try_run(&self, window: &QueryWindow) -> Result<PipelineRun> {
        let batch = self.fetcher.fetch(window).await?;

        let records = normalize_all(&batch.responses);
        let records = self.enricher.enrich_all(records);
        let records = dedup_and_sort(records);

        if self.profile() == EnrichmentProfile::Security {
            let relevant = records
                .iter()
                .filter(|r| r.derived.is_security_relevant == Some(true))
                .count();
            metrics::enrich::security_relevant(relevant);
        }

        let summary = summarize(&records, self.profile(), &self.enricher.weights);
        info!(
            total = summary.total_logs,
            responses = batch.responses.len(),
            failed_queries = batch.failures.len(),
            "Processed log records"
        );

        Ok(PipelineRun {
            document: DashboardDocument::new(records, summary, self.max_logs),
            failures: batch.failures,
        })
    }
}
