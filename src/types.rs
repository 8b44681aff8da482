use crate::constants::UNKNOWN;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Backend a record was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Loki,
    Quickwit,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Loki => "loki",
            LogSource::Quickwit => "quickwit",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic severity inferred from log text. Not backend-authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
    #[default]
    Unknown,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Security-flavored category assigned to Quickwit records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityCategory {
    Auth,
    Access,
    Security,
    Network,
    System,
    Application,
    General,
}

impl SecurityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityCategory::Auth => "auth",
            SecurityCategory::Access => "access",
            SecurityCategory::Security => "security",
            SecurityCategory::Network => "network",
            SecurityCategory::System => "system",
            SecurityCategory::Application => "application",
            SecurityCategory::General => "general",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "auth" => Some(SecurityCategory::Auth),
            "access" => Some(SecurityCategory::Access),
            "security" => Some(SecurityCategory::Security),
            "network" => Some(SecurityCategory::Network),
            "system" => Some(SecurityCategory::System),
            "application" => Some(SecurityCategory::Application),
            "general" => Some(SecurityCategory::General),
            _ => None,
        }
    }

    /// Categories that make a record security-relevant on their own
    pub fn is_sensitive(&self) -> bool {
        matches!(
            self,
            SecurityCategory::Auth | SecurityCategory::Access | SecurityCategory::Security
        )
    }
}

/// Well-known security attributes pulled out of a Quickwit document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_level: Option<String>,
}

impl SecurityFields {
    pub fn is_empty(&self) -> bool {
        self == &SecurityFields::default()
    }
}

/// Fields computed by the enricher. Security scores stay `None` for
/// operational (Loki) records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    pub keywords: Vec<String>,
    pub hour: String,
    pub date: String,
    pub message_length: usize,
    pub word_count: usize,
    pub is_demo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SecurityCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_security_relevant: Option<bool>,
}

/// Backend-agnostic representation of one log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalLogRecord {
    /// Epoch milliseconds, floor of the backend nanosecond timestamp
    pub timestamp_ms: u64,
    pub message: String,
    pub source: LogSource,
    pub labels: BTreeMap<String, String>,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityFields>,
    #[serde(default)]
    pub derived: DerivedFields,
}

impl CanonicalLogRecord {
    pub fn new(timestamp_ms: u64, message: impl Into<String>, source: LogSource) -> Self {
        Self {
            timestamp_ms,
            message: message.into(),
            source,
            labels: BTreeMap::new(),
            level: LogLevel::Unknown,
            security: None,
            derived: DerivedFields::default(),
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn label_or_unknown(&self, key: &str) -> &str {
        self.label(key).unwrap_or(UNKNOWN)
    }

    /// `service_name`, then `container`, then "unknown"
    pub fn service_name(&self) -> &str {
        self.label("service_name")
            .or_else(|| self.label("container"))
            .unwrap_or(UNKNOWN)
    }

    pub fn source_ip(&self) -> Option<&str> {
        self.security.as_ref().and_then(|s| s.source_ip.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_fallbacks() {
        let mut record = CanonicalLogRecord::new(1, "hello", LogSource::Loki);
        assert_eq!(record.service_name(), "unknown");

        record.labels.insert("container".to_string(), "nginx".to_string());
        assert_eq!(record.service_name(), "nginx");

        record.labels.insert("service_name".to_string(), "frontend".to_string());
        assert_eq!(record.service_name(), "frontend");
    }

    #[test]
    fn test_empty_labels_count_as_missing() {
        let mut record = CanonicalLogRecord::new(1, "hello", LogSource::Quickwit);
        record.labels.insert("service_name".to_string(), String::new());
        assert_eq!(record.service_name(), "unknown");
    }

    #[test]
    fn test_enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&LogSource::Quickwit).unwrap(), "\"quickwit\"");
        assert_eq!(serde_json::to_string(&LogLevel::Warning).unwrap(), "\"warning\"");
        assert_eq!(serde_json::to_string(&SecurityCategory::Auth).unwrap(), "\"auth\"");
    }

    #[test]
    fn test_operational_record_omits_security_scores() {
        let record = CanonicalLogRecord::new(42, "ok", LogSource::Loki);
        let json = serde_json::to_value(&record).unwrap();
        let derived = json.get("derived").unwrap();
        assert!(derived.get("risk_score").is_none());
        assert!(derived.get("anomaly_score").is_none());
        assert!(json.get("security").is_none());
    }
}
