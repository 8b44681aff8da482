use chrono::{DateTime, FixedOffset, Local, Offset, Timelike, Utc};
use tracing::warn;

use crate::config::ScoringWeights;
use crate::pipeline::processing::vocabulary::{
    count_matches, match_category, match_keywords, match_level, HIGH_RISK_KEYWORDS,
    MEDIUM_RISK_KEYWORDS, UNAUTHORIZED_ACCESS_KEYWORDS,
};
use crate::types::{CanonicalLogRecord, LogLevel, LogSource, SecurityCategory};

/// Labels consulted, in order, when the message carries no level token
const LEVEL_FALLBACK_LABELS: [&str; 3] = ["severity_text", "level", "severity"];

/// Clock used for hour buckets and off-hours detection
#[derive(Debug, Clone, Copy)]
pub enum HourClock {
    Local,
    Fixed(FixedOffset),
}

impl HourClock {
    /// Offsets must lie strictly within +/- 24 hours; anything else uses local time.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        let Some(minutes) = minutes else {
            return HourClock::Local;
        };
        match minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            Some(offset) => HourClock::Fixed(offset),
            None => {
                warn!("UTC offset of {} minutes is out of range, using local time", minutes);
                HourClock::Local
            }
        }
    }

    pub fn utc() -> Self {
        HourClock::Fixed(Utc.fix())
    }

    /// (hour of day, "YYYY-MM-DD") for an epoch-millisecond timestamp
    pub fn hour_and_date(&self, timestamp_ms: u64) -> (u32, String) {
        let millis = i64::try_from(timestamp_ms).unwrap_or(i64::MAX);
        let utc = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default();
        match self {
            HourClock::Local => {
                let local = utc.with_timezone(&Local);
                (local.hour(), local.format("%Y-%m-%d").to_string())
            }
            HourClock::Fixed(offset) => {
                let fixed = utc.with_timezone(offset);
                (fixed.hour(), fixed.format("%Y-%m-%d").to_string())
            }
        }
    }
}

/// Operational records get level, keywords and time fields; security
/// records additionally get category, risk, relevance and anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentProfile {
    Operational,
    Security,
}

impl From<LogSource> for EnrichmentProfile {
    fn from(source: LogSource) -> Self {
        match source {
            LogSource::Loki => EnrichmentProfile::Operational,
            LogSource::Quickwit => EnrichmentProfile::Security,
        }
    }
}

/// Trait for deriving fields on canonical log records
pub trait Enricher {
    /// Consume a normalized record and return it with `derived` populated
    fn enrich(&self, record: CanonicalLogRecord) -> CanonicalLogRecord;

    fn enrich_all(&self, records: Vec<CanonicalLogRecord>) -> Vec<CanonicalLogRecord> {
        records.into_iter().map(|r| self.enrich(r)).collect()
    }
}

/// Table-driven enricher. Deterministic for a fixed clock.
#[derive(Debug, Clone)]
pub struct DefaultEnricher {
    pub profile: EnrichmentProfile,
    pub weights: ScoringWeights,
    pub clock: HourClock,
}

impl DefaultEnricher {
    pub fn new(profile: EnrichmentProfile, weights: ScoringWeights, clock: HourClock) -> Self {
        Self {
            profile,
            weights,
            clock,
        }
    }

    fn extract_level(&self, record: &CanonicalLogRecord) -> LogLevel {
        let level = match_level(&record.message);
        if level != LogLevel::Unknown {
            return level;
        }
        LEVEL_FALLBACK_LABELS
            .iter()
            .filter_map(|key| record.label(key))
            .map(match_level)
            .find(|l| *l != LogLevel::Unknown)
            .unwrap_or(LogLevel::Unknown)
    }

    fn categorize(&self, record: &CanonicalLogRecord) -> SecurityCategory {
        match match_category(&record.message) {
            SecurityCategory::General => record
                .label("category")
                .and_then(SecurityCategory::from_name)
                .unwrap_or(SecurityCategory::General),
            category => category,
        }
    }

    fn level_weight(&self, level: LogLevel) -> u32 {
        let w = &self.weights;
        u32::from(match level {
            LogLevel::Error => w.error_weight,
            LogLevel::Warning => w.warning_weight,
            LogLevel::Info => w.info_weight,
            LogLevel::Debug => w.debug_weight,
            LogLevel::Unknown => 0,
        })
    }

    pub fn risk_score(&self, level: LogLevel, message: &str) -> u8 {
        let w = &self.weights;
        let lower = message.to_lowercase();
        let score = self.level_weight(level)
            + u32::from(w.high_risk_keyword_weight) * count_matches(&lower, &HIGH_RISK_KEYWORDS) as u32
            + u32::from(w.medium_risk_keyword_weight) * count_matches(&lower, &MEDIUM_RISK_KEYWORDS) as u32;
        score.min(u32::from(w.max_risk_score)) as u8
    }

    pub fn is_security_relevant(
        &self,
        category: SecurityCategory,
        risk_score: u8,
        level: LogLevel,
        message: &str,
    ) -> bool {
        category.is_sensitive()
            || risk_score >= self.weights.relevance_risk_threshold
            || matches!(level, LogLevel::Error | LogLevel::Warning)
            || count_matches(&message.to_lowercase(), &UNAUTHORIZED_ACCESS_KEYWORDS) > 0
    }

    pub fn anomaly_score(&self, hour: u32, message_length: usize, risk_score: u8, relevant: bool) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;
        if hour < w.off_hours_start || hour > w.off_hours_end {
            score += w.off_hours_increment;
        }
        if message_length < w.min_message_length || message_length > w.max_message_length {
            score += w.length_increment;
        }
        if risk_score >= w.high_risk_threshold {
            score += w.high_risk_increment;
        }
        if relevant {
            score += w.relevance_increment;
        }
        score.clamp(0.0, 1.0)
    }
}

impl Enricher for DefaultEnricher {
    fn enrich(&self, mut record: CanonicalLogRecord) -> CanonicalLogRecord {
        record.level = self.extract_level(&record);

        let (hour, date) = self.clock.hour_and_date(record.timestamp_ms);
        let derived = &mut record.derived;
        derived.keywords = match_keywords(&record.message);
        derived.hour = format!("{:02}:00", hour);
        derived.date = date;
        derived.message_length = record.message.chars().count();
        derived.word_count = record.message.split_whitespace().count();
        derived.is_demo = record.message.contains("[DEMO]")
            || record.labels.get("demo_data").is_some_and(|v| v == "true");

        if self.profile == EnrichmentProfile::Security {
            let category = self.categorize(&record);
            let risk = self.risk_score(record.level, &record.message);
            let relevant = self.is_security_relevant(category, risk, record.level, &record.message);
            let anomaly = self.anomaly_score(hour, record.derived.message_length, risk, relevant);

            let derived = &mut record.derived;
            derived.category = Some(category);
            derived.risk_score = Some(risk);
            derived.is_security_relevant = Some(relevant);
            derived.anomaly_score = Some(anomaly);
        }

        record
    }
}
