// Loader pipeline: ingestion, processing and emission

pub mod emit;
pub mod ingestion;
pub mod processing;
pub mod runner;
pub mod system_metrics;

// Re-export key types from each stage
pub use emit::{emit, DashboardDocument};
pub use runner::{LogPipeline, PipelineRun};
pub use system_metrics::{MetricsCollector, MetricsDocument, MetricsRun};
