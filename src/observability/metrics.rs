//! Run telemetry for the loaders
//!
//! Counters and histograms are recorded through the `metrics` facade into an
//! in-process Prometheus recorder. A loader run is short-lived, so nothing is
//! scraped: when a Pushgateway is configured the rendered snapshot is pushed
//! once the JSON document has been written.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::PUSHGATEWAY_JOB;
use crate::error::{LoaderError, Result};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names follow obs_{phase}_{name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("obs_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("obs_", $phase, "_", $name)
    };
}

/// Install the recorder. Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                debug!("Prometheus recorder handle already stored");
            }
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Exposition text of everything recorded so far
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

pub mod fetch {
    pub fn attempt(backend: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "fetch", "attempts"), "backend" => backend)
            .increment(1);
    }

    pub fn retry(backend: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "fetch", "retries"), "backend" => backend)
            .increment(1);
    }

    pub fn failure(backend: &'static str, kind: &'static str) {
        ::metrics::counter!(
            phase_metric!(counter, "fetch", "failures"),
            "backend" => backend,
            "kind" => kind
        )
        .increment(1);
    }

    pub fn duration(backend: &'static str, secs: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "fetch", "duration_seconds"), "backend" => backend)
            .record(secs);
    }
}

pub mod normalize {
    pub fn records(source: &'static str, count: usize) {
        ::metrics::counter!(phase_metric!(counter, "normalize", "records"), "source" => source)
            .increment(count as u64);
    }
}

pub mod dedup {
    pub fn dropped(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "dedup", "dropped")).increment(count as u64);
    }
}

pub mod enrich {
    pub fn security_relevant(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "enrich", "security_relevant"))
            .increment(count as u64);
    }
}

pub mod run {
    pub fn completed(backend: &'static str, emitted: usize, secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "run", "completed"), "backend" => backend)
            .increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "run", "emitted_records"), "backend" => backend)
            .record(emitted as f64);
        ::metrics::histogram!(phase_metric!(histogram, "run", "duration_seconds"), "backend" => backend)
            .record(secs);
    }
}

/// Push the current snapshot to a Pushgateway under the loader job.
pub async fn push_to_gateway(pushgateway_url: &str, instance: &str) -> Result<()> {
    let Some(body) = render() else {
        debug!("No metrics recorder installed, skipping Pushgateway push");
        return Ok(());
    };

    let push_url = format!(
        "{}/metrics/job/{}/instance/{}",
        pushgateway_url.trim_end_matches('/'),
        PUSHGATEWAY_JOB,
        instance
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let resp = client
        .post(&push_url)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .send()
        .await
        .map_err(LoaderError::transport)?;

    if !resp.status().is_success() {
        return Err(LoaderError::Status {
            backend: "pushgateway".to_string(),
            status: resp.status().as_u16(),
        });
    }

    info!("Pushed metrics to Pushgateway for instance={}", instance);
    Ok(())
}
