// Pipeline processing: normalization, enrichment, dedup/sort and aggregation

pub mod dedup;
pub mod enrich;
pub mod health;
pub mod normalize;
pub mod summary;
pub mod vocabulary;

pub use enrich::{DefaultEnricher, Enricher, EnrichmentProfile, HourClock};
pub use summary::LogSummary;
