// Observability: run telemetry recorded through the metrics facade

pub mod metrics;
