//! Prometheus snapshot document and health scoring input.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::constants::{APPLICATION_METRIC_QUERIES, OBSERVABILITY_METRIC_QUERIES, SYSTEM_METRIC_QUERIES};
use crate::observability::metrics;
use crate::pipeline::ingestion::{Backend, FetchFailure, PrometheusClient};
use crate::pipeline::processing::health::{assess, HealthIndicators, HealthInputs};

/// Metric name to value; `null` when the query failed or matched nothing
pub type MetricValues = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsDocument {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub system_metrics: MetricValues,
    pub application_metrics: MetricValues,
    pub observability_stack_metrics: MetricValues,
    pub summary: HealthIndicators,
}

impl MetricsDocument {
    /// Every metric `null`, scored as "no factors"
    pub fn unreachable(at: DateTime<Utc>) -> Self {
        let nulls = |table: &[(&str, &str)]| -> MetricValues {
            table.iter().map(|(name, _)| (name.to_string(), None)).collect()
        };
        let system_metrics = nulls(&SYSTEM_METRIC_QUERIES[..]);
        let application_metrics = nulls(&APPLICATION_METRIC_QUERIES[..]);
        let observability_stack_metrics = nulls(&OBSERVABILITY_METRIC_QUERIES[..]);
        Self {
            timestamp: at.timestamp_millis(),
            summary: assess(&HealthInputs::default()),
            system_metrics,
            application_metrics,
            observability_stack_metrics,
        }
    }
}

fn value(values: &MetricValues, name: &str) -> Option<f64> {
    values.get(name).copied().flatten()
}

pub fn health_inputs(
    system: &MetricValues,
    application: &MetricValues,
    observability: &MetricValues,
) -> HealthInputs {
    HealthInputs {
        cpu_usage: value(system, "cpu_usage"),
        memory_usage: value(system, "memory_usage"),
        disk_usage: value(system, "disk_usage"),
        error_rate: value(application, "error_rate"),
        container_restart_count: value(observability, "container_restart_count"),
    }
}

fn pick(table: &[(&'static str, &'static str)], names: &[&str]) -> Vec<(&'static str, &'static str)> {
    table.iter().filter(|(n, _)| names.contains(n)).copied().collect()
}

#[derive(Debug)]
pub struct MetricsRun {
    pub document: MetricsDocument,
    pub failures: Vec<FetchFailure>,
}

/// Evaluates the fixed query tables one by one
pub struct MetricsCollector {
    client: PrometheusClient,
}

impl MetricsCollector {
    pub fn new(client: PrometheusClient) -> Self {
        Self { client }
    }

    async fn query_table(
        &self,
        table: &[(&str, &str)],
        at: DateTime<Utc>,
        failures: &mut Vec<FetchFailure>,
    ) -> MetricValues {
        let mut values = MetricValues::new();
        for (name, query) in table {
            let value = match self.client.query_value(query, at).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("Query for {} failed: {}", name, e);
                    metrics::fetch::failure(Backend::Prometheus.as_str(), e.kind().as_str());
                    failures.push(FetchFailure::new(Backend::Prometheus, *query, &e));
                    None
                }
            };
            values.insert(name.to_string(), value);
        }
        values
    }

    /// Only the metrics health scoring reads
    pub async fn health(&self) -> (HealthIndicators, Vec<FetchFailure>) {
        let at = Utc::now();
        let mut failures = Vec::new();
        let system = self
            .query_table(&pick(&SYSTEM_METRIC_QUERIES[..], &["cpu_usage", "memory_usage", "disk_usage"]), at, &mut failures)
            .await;
        let application = self
            .query_table(&pick(&APPLICATION_METRIC_QUERIES[..], &["error_rate"]), at, &mut failures)
            .await;
        let observability = self
            .query_table(&pick(&OBSERVABILITY_METRIC_QUERIES[..], &["container_restart_count"]), at, &mut failures)
            .await;
        let inputs = health_inputs(&system, &application, &observability);
        (assess(&inputs), failures)
    }

    /// Never fails: unreachable metrics become `null`
    pub async fn collect(&self) -> MetricsRun {
        let run_id = Uuid::new_v4();
        let span = info_span!("metrics_run", backend = "prometheus", run_id = %run_id);

        async {
            let started = std::time::Instant::now();
            let at = Utc::now();
            let mut failures = Vec::new();

            let system_metrics = self.query_table(&SYSTEM_METRIC_QUERIES, at, &mut failures).await;
            let application_metrics = self.query_table(&APPLICATION_METRIC_QUERIES, at, &mut failures).await;
            let observability_stack_metrics = self
                .query_table(&OBSERVABILITY_METRIC_QUERIES, at, &mut failures)
                .await;

            let summary = assess(&health_inputs(
                &system_metrics,
                &application_metrics,
                &observability_stack_metrics,
            ));
            let answered = [&system_metrics, &application_metrics, &observability_stack_metrics]
                .iter()
                .flat_map(|t| t.values())
                .filter(|v| v.is_some())
                .count();

            info!(
                answered,
                failed = failures.len(),
                overall_health = summary.overall_health.as_str(),
                "Collected Prometheus snapshot"
            );
            metrics::run::completed(Backend::Prometheus.as_str(), answered, started.elapsed().as_secs_f64());

            MetricsRun {
                document: MetricsDocument {
                    timestamp: at.timestamp_millis(),
                    system_metrics,
                    application_metrics,
                    observability_stack_metrics,
                    summary,
                },
                failures,
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::health::OverallHealth;

    #[test]
    fn test_unreachable_document_shape() {
        let doc = MetricsDocument::unreachable(Utc::now());
        assert_eq!(doc.system_metrics.len(), 7);
        assert_eq!(doc.application_metrics.len(), 7);
        assert_eq!(doc.observability_stack_metrics.len(), 11);
        assert_eq!(doc.summary.overall_health, OverallHealth::Critical);

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["system_metrics"]["cpu_usage"].is_null());
        assert_eq!(json["summary"]["overall_health"], "critical");
        assert_eq!(json["summary"]["performance_score"], 0.0);
    }

    #[test]
    fn test_health_inputs_read_named_metrics() {
        let mut system = MetricValues::new();
        system.insert("cpu_usage".to_string(), Some(42.0));
        system.insert("memory_usage".to_string(), None);
        let mut application = MetricValues::new();
        application.insert("error_rate".to_string(), Some(7.5));

        let inputs = health_inputs(&system, &application, &MetricValues::new());
        assert_eq!(inputs.cpu_usage, Some(42.0));
        assert_eq!(inputs.memory_usage, None);
        assert_eq!(inputs.error_rate, Some(7.5));
        assert_eq!(inputs.container_restart_count, None);
    }
}
