use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::ScoringWeights;
use crate::pipeline::processing::enrich::EnrichmentProfile;
use crate::pipeline::processing::health::HealthIndicators;
use crate::types::CanonicalLogRecord;

pub type Counts = BTreeMap<String, usize>;

/// Aggregate counts over the final record set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogSummary {
    pub total_logs: usize,
    pub demo_logs: usize,
    pub live_logs: usize,
    pub by_level: Counts,
    pub by_service: Counts,
    pub by_hour: Counts,
    pub by_category: Counts,
    #[serde(flatten)]
    pub security: Option<SecuritySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthIndicators>,
}

/// Extra aggregates for security-profile runs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecuritySummary {
    pub security_relevant: usize,
    pub high_risk: usize,
    pub failed_logins: usize,
    pub average_risk_score: f64,
    pub average_anomaly_score: f64,
    pub threat_sources: Counts,
    pub attack_types: Counts,
    pub by_event_type: Counts,
}

fn bump(counts: &mut Counts, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

impl LogSummary {
    /// Zero counts with the same shape a populated summary would have
    pub fn empty(profile: EnrichmentProfile) -> Self {
        summarize(&[], profile, &ScoringWeights::default())
    }
}

pub fn summarize(
    records: &[CanonicalLogRecord],
    profile: EnrichmentProfile,
    weights: &ScoringWeights,
) -> LogSummary {
    let mut summary = LogSummary {
        total_logs: records.len(),
        ..Default::default()
    };

    for record in records {
        if record.derived.is_demo {
            summary.demo_logs += 1;
        }
        bump(&mut summary.by_level, record.level.as_str());
        bump(&mut summary.by_service, record.service_name());
        if !record.derived.hour.is_empty() {
            bump(&mut summary.by_hour, &record.derived.hour);
        }
        let category = match (profile, record.derived.category) {
            (EnrichmentProfile::Security, Some(category)) => category.as_str(),
            _ => record.label("category").unwrap_or("general"),
        };
        bump(&mut summary.by_category, category);
    }
    summary.live_logs = summary.total_logs - summary.demo_logs;

    if profile == EnrichmentProfile::Security {
        summary.security = Some(summarize_security(records, weights));
    }
    summary
}

fn summarize_security(records: &[CanonicalLogRecord], weights: &ScoringWeights) -> SecuritySummary {
    let mut security = SecuritySummary::default();
    let mut risk_total = 0.0;
    let mut anomaly_total = 0.0;

    for record in records {
        let derived = &record.derived;
        let risk = derived.risk_score.unwrap_or(0);
        risk_total += f64::from(risk);
        anomaly_total += derived.anomaly_score.unwrap_or(0.0);

        if derived.is_security_relevant.unwrap_or(false) {
            security.security_relevant += 1;
        }
        if risk >= weights.high_risk_threshold {
            security.high_risk += 1;
        }
        let lower = record.message.to_lowercase();
        if lower.contains("failed") && lower.contains("login") {
            security.failed_logins += 1;
        }

        if let Some(fields) = &record.security {
            if let Some(ip) = fields.source_ip.as_deref() {
                bump(&mut security.threat_sources, ip);
            }
            if let Some(attack) = fields.attack_type.as_deref() {
                bump(&mut security.attack_types, attack);
            }
            if let Some(event) = fields.event_type.as_deref() {
                bump(&mut security.by_event_type, event);
            }
        }
    }

    if !records.is_empty() {
        security.average_risk_score = risk_total / records.len() as f64;
        security.average_anomaly_score = anomaly_total / records.len() as f64;
    }
    security
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::enrich::{DefaultEnricher, Enricher, HourClock};
    use crate::types::{LogSource, SecurityFields};

    fn enrich(profile: EnrichmentProfile, records: Vec<CanonicalLogRecord>) -> Vec<CanonicalLogRecord> {
        DefaultEnricher::new(profile, ScoringWeights::default(), HourClock::utc()).enrich_all(records)
    }

    #[test]
    fn test_operational_counts() {
        let mut a = CanonicalLogRecord::new(1_699_963_200_000, "ERROR boom", LogSource::Loki);
        a.labels.insert("service_name".to_string(), "api".to_string());
        let mut b = CanonicalLogRecord::new(1_699_963_260_000, "[DEMO] info tick", LogSource::Loki);
        b.labels.insert("container".to_string(), "worker".to_string());
        b.labels.insert("category".to_string(), "batch".to_string());
        let c = CanonicalLogRecord::new(1_699_966_800_000, "plain", LogSource::Loki);

        let records = enrich(EnrichmentProfile::Operational, vec![a, b, c]);
        let summary = summarize(&records, EnrichmentProfile::Operational, &ScoringWeights::default());

        assert_eq!(summary.total_logs, 3);
        assert_eq!(summary.demo_logs, 1);
        assert_eq!(summary.live_logs, 2);
        assert_eq!(summary.by_level["error"], 1);
        assert_eq!(summary.by_level["info"], 1);
        assert_eq!(summary.by_level["unknown"], 1);
        assert_eq!(summary.by_service["api"], 1);
        assert_eq!(summary.by_service["worker"], 1);
        assert_eq!(summary.by_service["unknown"], 1);
        assert_eq!(summary.by_hour["12:00"], 2);
        assert_eq!(summary.by_hour["13:00"], 1);
        assert_eq!(summary.by_category["batch"], 1);
        assert_eq!(summary.by_category["general"], 2);
        assert!(summary.security.is_none());
    }

    #[test]
    fn test_security_aggregates() {
        let mut a = CanonicalLogRecord::new(1_699_963_200_000, "Failed login for root", LogSource::Quickwit);
        a.security = Some(SecurityFields {
            source_ip: Some("203.0.113.9".to_string()),
            event_type: Some("login".to_string()),
            ..Default::default()
        });
        let mut b = CanonicalLogRecord::new(1_699_963_200_001, "intrusion attack blocked", LogSource::Quickwit);
        b.security = Some(SecurityFields {
            source_ip: Some("203.0.113.9".to_string()),
            attack_type: Some("sqli".to_string()),
            ..Default::default()
        });
        let c = CanonicalLogRecord::new(1_699_963_200_002, "cache warmed in 12ms", LogSource::Quickwit);

        let records = enrich(EnrichmentProfile::Security, vec![a, b, c]);
        let summary = summarize(&records, EnrichmentProfile::Security, &ScoringWeights::default());
        let security = summary.security.clone().unwrap();

        assert_eq!(summary.by_category["auth"], 1);
        assert_eq!(summary.by_category["security"], 1);
        assert_eq!(summary.by_category["general"], 1);
        assert_eq!(security.security_relevant, 2);
        assert_eq!(security.failed_logins, 1);
        assert_eq!(security.threat_sources["203.0.113.9"], 2);
        assert_eq!(security.attack_types["sqli"], 1);
        assert_eq!(security.by_event_type["login"], 1);
        // risks: 2 (failed), 4 (intrusion, attack), 0
        assert_eq!(security.high_risk, 0);
        assert!((security.average_risk_score - 2.0).abs() < 1e-9);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["failed_logins"], 1);
        assert!(json.get("health").is_none());
    }

    #[test]
    fn test_empty_summary_shape() {
        let json = serde_json::to_value(LogSummary::empty(EnrichmentProfile::Security)).unwrap();
        assert_eq!(json["total_logs"], 0);
        assert_eq!(json["security_relevant"], 0);
        assert_eq!(json["average_risk_score"], 0.0);
        assert_eq!(json["by_level"], serde_json::json!({}));

        let json = serde_json::to_value(LogSummary::empty(EnrichmentProfile::Operational)).unwrap();
        assert!(json.get("security_relevant").is_none());
    }
}
