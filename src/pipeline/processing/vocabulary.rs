//! Fixed, ordered match tables for the enricher.
//!
//! Every table is evaluated top to bottom with substring matching, and the
//! first row that matches wins. Row order is the tie-break.

use crate::types::{LogLevel, SecurityCategory};

/// Uppercase tokens per level, checked against the uppercased text
pub const LEVEL_TABLE: [(LogLevel, &[&str]); 4] = [
    (LogLevel::Error, &["ERROR", "ERR", "FATAL"]),
    (LogLevel::Warning, &["WARN", "WARNING"]),
    (LogLevel::Info, &["INFO", "INFORMATION"]),
    (LogLevel::Debug, &["DEBUG", "DBG"]),
];

/// Keywords reported in this order, never message order
pub const KEYWORD_VOCABULARY: [&str; 30] = [
    "http", "https", "api", "error", "warning", "failed", "success",
    "database", "db", "sql", "query", "connection", "timeout",
    "auth", "login", "logout", "user", "permission", "security",
    "kubernetes", "k8s", "pod", "service", "deployment",
    "nginx", "apache", "tcp", "udp", "port", "network",
];

pub const MAX_KEYWORDS: usize = 5;

pub const CATEGORY_TABLE: [(SecurityCategory, &[&str]); 6] = [
    (
        SecurityCategory::Auth,
        &["login", "logout", "authentication", "authorize", "auth", "signin", "signout"],
    ),
    (
        SecurityCategory::Access,
        &["denied", "forbidden", "unauthorized", "permission", "access"],
    ),
    (
        SecurityCategory::Security,
        &["firewall", "intrusion", "malware", "virus", "attack", "exploit"],
    ),
    (
        SecurityCategory::Network,
        &["connection", "tcp", "udp", "port", "network", "socket"],
    ),
    (
        SecurityCategory::System,
        &["system", "kernel", "process", "service", "daemon"],
    ),
    (
        SecurityCategory::Application,
        &["application", "app", "web", "api", "endpoint"],
    ),
];

pub const HIGH_RISK_KEYWORDS: [&str; 6] = ["failed", "denied", "unauthorized", "error", "attack", "intrusion"];
pub const MEDIUM_RISK_KEYWORDS: [&str; 4] = ["warning", "timeout", "retry", "slow"];

/// Any of these makes a record security-relevant
pub const UNAUTHORIZED_ACCESS_KEYWORDS: [&str; 6] =
    ["failed", "denied", "unauthorized", "attack", "intrusion", "malware"];

pub fn match_level(text: &str) -> LogLevel {
    let upper = text.to_uppercase();
    LEVEL_TABLE
        .iter()
        .find(|(_, tokens)| tokens.iter().any(|t| upper.contains(t)))
        .map(|(level, _)| *level)
        .unwrap_or(LogLevel::Unknown)
}

pub fn match_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KEYWORD_VOCABULARY
        .iter()
        .filter(|k| lower.contains(*k))
        .take(MAX_KEYWORDS)
        .map(|k| k.to_string())
        .collect()
}

pub fn match_category(text: &str) -> SecurityCategory {
    let lower = text.to_lowercase();
    CATEGORY_TABLE
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(SecurityCategory::General)
}

/// Number of words from `words` that occur in already-lowercased `lower`
pub fn count_matches(lower: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| lower.contains(*w)).count()
}
