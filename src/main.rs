use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use observable_loaders::app::ports::HttpClientPort;
use observable_loaders::config::Config;
use observable_loaders::error::Result;
use observable_loaders::infra::ReqwestHttp;
use observable_loaders::logging;
use observable_loaders::observability::metrics;
use observable_loaders::pipeline::ingestion::{
    LogFetcher, LokiFetcher, PrometheusClient, QuickwitFetcher, QueryWindow, RetryPolicy,
};
use observable_loaders::pipeline::processing::{EnrichmentProfile, HourClock};
use observable_loaders::pipeline::{emit, DashboardDocument, LogPipeline, MetricsCollector, MetricsDocument};
use observable_loaders::types::LogSource;

#[derive(Parser)]
#[command(name = "observable-loaders")]
#[command(about = "Dashboard data loaders for Loki, Quickwit and Prometheus")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recent operational logs from Loki
    Loki {
        #[command(flatten)]
        logs: LogArgs,
        /// Maximum number of log lines to request
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Security-oriented logs from Quickwit
    Quickwit {
        #[command(flatten)]
        logs: LogArgs,
        /// Maximum hits across all sub-queries
        #[arg(long)]
        max_hits: Option<usize>,
    },
    /// Prometheus snapshot with health scoring
    Metrics {
        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },
}

#[derive(Args)]
struct LogArgs {
    /// Size of the query window in hours
    #[arg(long)]
    hours_back: Option<i64>,
    /// Attach Prometheus health indicators to the summary
    #[arg(long)]
    with_health: bool,
    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
}

fn http_client(timeout: std::time::Duration) -> Result<Arc<dyn HttpClientPort>> {
    Ok(Arc::new(ReqwestHttp::new(timeout)?))
}

fn metrics_collector(config: &Config) -> Result<MetricsCollector> {
    let http = http_client(config.prometheus.timeout())?;
    let client = PrometheusClient::new(http, config.prometheus.clone(), RetryPolicy::from(&config.retry));
    Ok(MetricsCollector::new(client))
}

fn build_pipeline(config: &Config, source: LogSource, with_health: bool) -> Result<LogPipeline> {
    let retry = RetryPolicy::from(&config.retry);
    let fetcher: Box<dyn LogFetcher> = match source {
        LogSource::Loki => Box::new(LokiFetcher::new(
            http_client(config.loki.timeout())?,
            config.loki.clone(),
            retry,
        )),
        LogSource::Quickwit => Box::new(QuickwitFetcher::new(
            http_client(config.quickwit.timeout())?,
            config.quickwit.clone(),
            retry,
        )),
    };
    let clock = HourClock::from_offset_minutes(config.observability.utc_offset_minutes);
    let mut pipeline = LogPipeline::new(fetcher, config.scoring.clone(), clock, config.output.max_logs);
    if with_health {
        pipeline = pipeline.with_health(metrics_collector(config)?);
    }
    Ok(pipeline)
}

async fn run_logs(config: &Config, source: LogSource, window: QueryWindow, with_health: bool) -> DashboardDocument {
    match build_pipeline(config, source, with_health) {
        Ok(pipeline) => {
            let run = pipeline.run(&window).await;
            for failure in &run.failures {
                warn!(
                    backend = failure.backend.as_str(),
                    kind = failure.kind.as_str(),
                    "Query '{}' failed: {}",
                    failure.query,
                    failure.message
                );
            }
            run.document
        }
        Err(e) => {
            error!("Could not set up the {} loader: {}", source, e);
            DashboardDocument::empty(EnrichmentProfile::from(source))
        }
    }
}

async fn run_metrics(config: &Config) -> MetricsDocument {
    match metrics_collector(config) {
        Ok(collector) => collector.collect().await.document,
        Err(e) => {
            error!("Could not set up the metrics loader: {}", e);
            MetricsDocument::unreachable(chrono::Utc::now())
        }
    }
}

fn write_stdout<T: serde::Serialize>(document: &T, pretty: bool) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = emit(&mut handle, document, pretty) {
        error!("Failed to write output: {}", e);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let (config, config_problems) = Config::load(cli.config.as_deref());

    let _guard = logging::init_logging(config.observability.log_dir.as_deref());
    for problem in &config_problems {
        warn!("Ignoring invalid configuration: {}", problem);
    }
    metrics::init_metrics();

    let pretty = config.output.pretty;
    let instance = match &cli.command {
        Commands::Loki { logs, limit } => {
            let window = QueryWindow::last_hours(
                logs.hours_back.unwrap_or(config.loki.hours_back),
                limit.unwrap_or(config.loki.limit),
            );
            let document = run_logs(&config, LogSource::Loki, window, logs.with_health).await;
            write_stdout(&document, pretty && !logs.compact);
            "loki"
        }
        Commands::Quickwit { logs, max_hits } => {
            let window = QueryWindow::last_hours(
                logs.hours_back.unwrap_or(config.quickwit.hours_back),
                max_hits.unwrap_or(config.quickwit.max_hits),
            );
            let document = run_logs(&config, LogSource::Quickwit, window, logs.with_health).await;
            write_stdout(&document, pretty && !logs.compact);
            "quickwit"
        }
        Commands::Metrics { compact } => {
            let document = run_metrics(&config).await;
            write_stdout(&document, pretty && !compact);
            "prometheus"
        }
    };

    if let Some(url) = &config.observability.pushgateway_url {
        if let Err(e) = metrics::push_to_gateway(url, instance).await {
            warn!("Pushgateway push failed: {}", e);
        }
    }

    info!("Loader finished");
    Ok(())
}
