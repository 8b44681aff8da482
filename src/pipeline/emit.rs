use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::error::Result;
use crate::pipeline::processing::enrich::EnrichmentProfile;
use crate::pipeline::processing::summary::LogSummary;
use crate::types::CanonicalLogRecord;

/// The log document read by the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardDocument {
    pub logs: Vec<CanonicalLogRecord>,
    pub summary: LogSummary,
    pub last_updated: DateTime<Utc>,
}

impl DashboardDocument {
    /// `summary` must already cover every record; only the log list is capped
    pub fn new(mut logs: Vec<CanonicalLogRecord>, summary: LogSummary, max_logs: usize) -> Self {
        logs.truncate(max_logs);
        Self {
            logs,
            summary,
            last_updated: Utc::now(),
        }
    }

    pub fn empty(profile: EnrichmentProfile) -> Self {
        Self::new(Vec::new(), LogSummary::empty(profile), 0)
    }
}

/// Serialize fully before writing so a failure never leaves half a document
pub fn emit<W: Write, T: Serialize>(writer: &mut W, document: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    writer.write_all(text.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogSource;
    use serde_json::Value;

    #[test]
    fn test_empty_document_is_valid_json() {
        let mut out = Vec::new();
        emit(&mut out, &DashboardDocument::empty(EnrichmentProfile::Operational), false).unwrap();

        let json: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["logs"], serde_json::json!([]));
        assert_eq!(json["summary"]["total_logs"], 0);
        let stamp = json["last_updated"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_logs_capped_after_summary() {
        let records: Vec<_> = (0..5)
            .map(|i| CanonicalLogRecord::new(100 - i, format!("line {}", i), LogSource::Loki))
            .collect();
        let summary = LogSummary {
            total_logs: records.len(),
            ..Default::default()
        };
        let doc = DashboardDocument::new(records, summary, 2);
        assert_eq!(doc.logs.len(), 2);
        assert_eq!(doc.logs[0].timestamp_ms, 100);
        assert_eq!(doc.summary.total_logs, 5);
    }

    #[test]
    fn test_pretty_output_ends_with_newline() {
        let mut out = Vec::new();
        emit(&mut out, &DashboardDocument::empty(EnrichmentProfile::Security), true).unwrap();
        assert!(out.ends_with(b"}\n"));
    }
}
