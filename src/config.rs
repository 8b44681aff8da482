use crate::constants::*;
use crate::error::{LoaderError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loki: LokiConfig,
    pub quickwit: QuickwitConfig,
    pub prometheus: PrometheusConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
    pub scoring: ScoringWeights,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LokiConfig {
    pub endpoint: String,
    pub query: String,
    pub hours_back: i64,
    pub limit: usize,
    pub timeout_seconds: u64,
}

impl Default for LokiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOKI_ENDPOINT.to_string(),
            query: DEFAULT_LOKI_QUERY.to_string(),
            hours_back: DEFAULT_HOURS_BACK,
            limit: DEFAULT_LOKI_LIMIT,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuickwitConfig {
    pub endpoint: String,
    pub index: String,
    pub queries: Vec<String>,
    pub hours_back: i64,
    pub max_hits: usize,
    pub timeout_seconds: u64,
}

impl Default for QuickwitConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_QUICKWIT_ENDPOINT.to_string(),
            index: DEFAULT_QUICKWIT_INDEX.to_string(),
            queries: DEFAULT_QUICKWIT_QUERIES.iter().map(|q| q.to_string()).collect(),
            hours_back: DEFAULT_HOURS_BACK,
            max_hits: DEFAULT_QUICKWIT_MAX_HITS,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PROMETHEUS_ENDPOINT.to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub max_logs: usize,
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_logs: DEFAULT_MAX_EMITTED_LOGS,
            pretty: true,
        }
    }
}

/// Heuristic weights for security scoring. The thresholds carry no
/// documented rationale; keep them here rather than inline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub error_weight: u8,
    pub warning_weight: u8,
    pub info_weight: u8,
    pub debug_weight: u8,
    pub high_risk_keyword_weight: u8,
    pub medium_risk_keyword_weight: u8,
    pub max_risk_score: u8,
    /// Risk score at which a record counts as high risk
    pub high_risk_threshold: u8,
    /// Risk score at which a record is security-relevant on its own
    pub relevance_risk_threshold: u8,
    pub off_hours_increment: f64,
    pub length_increment: f64,
    pub high_risk_increment: f64,
    pub relevance_increment: f64,
    /// Hours before this are off-hours
    pub off_hours_start: u32,
    /// Hours after this are off-hours
    pub off_hours_end: u32,
    pub min_message_length: usize,
    pub max_message_length: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            error_weight: 3,
            warning_weight: 2,
            info_weight: 1,
            debug_weight: 0,
            high_risk_keyword_weight: 2,
            medium_risk_keyword_weight: 1,
            max_risk_score: 10,
            high_risk_threshold: 5,
            relevance_risk_threshold: 3,
            off_hours_increment: 0.2,
            length_increment: 0.1,
            high_risk_increment: 0.3,
            relevance_increment: 0.2,
            off_hours_start: 6,
            off_hours_end: 22,
            min_message_length: 10,
            max_message_length: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Directory for the rolling JSON log file; console only when unset
    pub log_dir: Option<PathBuf>,
    pub pushgateway_url: Option<String>,
    /// Fixed offset for hour buckets; the local zone when unset
    pub utc_offset_minutes: Option<i32>,
}

impl LokiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl QuickwitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl PrometheusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then environment overrides.
    ///
    /// Never fails: an unusable file falls back to defaults and a bad env
    /// value is skipped. Both are returned so the caller can report them.
    pub fn load(path: Option<&Path>) -> (Self, Vec<LoaderError>) {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> (Self, Vec<LoaderError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();
        let mut config = match path.map(Self::from_file) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                problems.push(e);
                Self::default()
            }
            None => Self::default(),
        };
        problems.extend(config.apply_env_overrides(lookup));
        (config, problems)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            LoaderError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup. Blank values are
    /// ignored; unparsable values are skipped and returned.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Vec<LoaderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut problems = Vec::new();

        if let Some(endpoint) = get(LOKI_ENDPOINT_ENV) {
            self.loki.endpoint = endpoint;
        }
        if let Some(endpoint) = get(QUICKWIT_ENDPOINT_ENV) {
            self.quickwit.endpoint = endpoint;
        }
        if let Some(endpoint) = get(PROMETHEUS_ENDPOINT_ENV) {
            self.prometheus.endpoint = endpoint;
        }
        if let Some(dir) = get(LOG_DIR_ENV) {
            self.observability.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = get(PUSHGATEWAY_URL_ENV) {
            self.observability.pushgateway_url = Some(url);
        }
        if let Some(raw) = get(UTC_OFFSET_ENV) {
            match raw.parse::<i32>() {
                Ok(minutes) => self.observability.utc_offset_minutes = Some(minutes),
                Err(e) => problems.push(LoaderError::Config(format!(
                    "{} must be an integer: {}",
                    UTC_OFFSET_ENV, e
                ))),
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.loki.endpoint, "http://localhost:3100");
        assert_eq!(config.loki.hours_back, 2);
        assert_eq!(config.quickwit.queries.len(), 4);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.output.max_logs, 50);
        assert_eq!(config.scoring.high_risk_threshold, 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LOKI_ENDPOINT", "http://loki:3100"),
            ("QUICKWIT_ENDPOINT", "  "),
            ("OBS_UTC_OFFSET_MINUTES", "120"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        let problems = config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert!(problems.is_empty());

        assert_eq!(config.loki.endpoint, "http://loki:3100");
        // Blank values keep the default
        assert_eq!(config.quickwit.endpoint, "http://localhost:7280");
        assert_eq!(config.observability.utc_offset_minutes, Some(120));
    }

    #[test]
    fn test_invalid_offset_is_a_config_error() {
        let mut config = Config::default();
        let problems = config.apply_env_overrides(|key| {
            (key == "OBS_UTC_OFFSET_MINUTES").then(|| "two hours".to_string())
        });
        assert_eq!(problems.len(), 1);
        assert!(matches!(problems[0], LoaderError::Config(_)));
        assert_eq!(config.observability.utc_offset_minutes, None);
    }

    #[test]
    fn test_bad_offset_keeps_other_overrides() {
        let env: HashMap<&str, &str> = [
            ("LOKI_ENDPOINT", "http://loki.prod:3100"),
            ("OBS_UTC_OFFSET_MINUTES", "two"),
            ("OBS_PUSHGATEWAY_URL", "http://pushgateway:9091"),
        ]
        .into_iter()
        .collect();

        let (config, problems) = Config::load_with(None, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(problems.len(), 1);
        assert_eq!(config.loki.endpoint, "http://loki.prod:3100");
        assert_eq!(
            config.observability.pushgateway_url.as_deref(),
            Some("http://pushgateway:9091")
        );
        assert_eq!(config.observability.utc_offset_minutes, None);
    }

    #[test]
    fn test_bad_file_still_applies_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[loki\nendpoint = ").unwrap();

        let (config, problems) = Config::load_with(Some(file.path()), |key| {
            (key == "LOKI_ENDPOINT").then(|| "http://loki.prod:3100".to_string())
        });

        assert_eq!(problems.len(), 1);
        assert!(matches!(problems[0], LoaderError::Toml(_)));
        assert_eq!(config.loki.endpoint, "http://loki.prod:3100");
        assert_eq!(config.quickwit.index, "otel-logs-v0_7");
    }

    #[test]
    fn test_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[loki]
endpoint = "http://10.0.0.5:3100"
limit = 200

[scoring]
high_risk_threshold = 6
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.loki.endpoint, "http://10.0.0.5:3100");
        assert_eq!(config.loki.limit, 200);
        assert_eq!(config.loki.hours_back, 2);
        assert_eq!(config.scoring.high_risk_threshold, 6);
        assert_eq!(config.scoring.error_weight, 3);
        assert_eq!(config.quickwit.index, "otel-logs-v0_7");
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let result = Config::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(LoaderError::Config(_))));
    }
}
