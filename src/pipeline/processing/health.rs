//! Health indicators derived from a Prometheus snapshot.

use serde::Serialize;

/// Metrics the health score reads; `None` is excluded, never treated as zero
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HealthInputs {
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
    pub disk_usage: Option<f64>,
    pub error_rate: Option<f64>,
    pub container_restart_count: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Good,
    Warning,
    Critical,
}

impl OverallHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallHealth::Good => "good",
            OverallHealth::Warning => "warning",
            OverallHealth::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthIndicators {
    pub overall_health: OverallHealth,
    pub critical_alerts: usize,
    pub performance_score: f64,
    pub availability_score: f64,
    pub recommendations: Vec<String>,
}

const CPU_LIMIT: f64 = 80.0;
const MEMORY_LIMIT: f64 = 85.0;
const DISK_LIMIT: f64 = 90.0;
const ERROR_RATE_LIMIT: f64 = 5.0;
const RESTART_LIMIT: f64 = 5.0;

/// Words that mark a recommendation as a critical alert
const ALERT_WORDS: [&str; 3] = ["high", "low", "critical"];

/// Mean of both scores: good at 80 and above, warning at 60, else critical
pub fn classify(performance_score: f64, availability_score: f64) -> OverallHealth {
    let overall = (performance_score + availability_score) / 2.0;
    if overall >= 80.0 {
        OverallHealth::Good
    } else if overall >= 60.0 {
        OverallHealth::Warning
    } else {
        OverallHealth::Critical
    }
}

fn mean(factors: &[f64]) -> f64 {
    if factors.is_empty() {
        0.0
    } else {
        factors.iter().sum::<f64>() / factors.len() as f64
    }
}

pub fn assess(inputs: &HealthInputs) -> HealthIndicators {
    let mut recommendations = Vec::new();

    let mut performance = Vec::new();
    if let Some(cpu) = inputs.cpu_usage {
        performance.push((100.0 - cpu).max(0.0));
        if cpu > CPU_LIMIT {
            recommendations.push("High CPU usage detected".to_string());
        }
    }
    if let Some(memory) = inputs.memory_usage {
        performance.push((100.0 - memory).max(0.0));
        if memory > MEMORY_LIMIT {
            recommendations.push("High memory usage detected".to_string());
        }
    }
    if let Some(disk) = inputs.disk_usage {
        performance.push((100.0 - disk).max(0.0));
        if disk > DISK_LIMIT {
            recommendations.push("Disk space running low".to_string());
        }
    }

    let mut availability = vec![100.0];
    if let Some(rate) = inputs.error_rate.filter(|r| *r > ERROR_RATE_LIMIT) {
        availability.push((100.0 - rate * 10.0).max(0.0));
        recommendations.push(format!("High error rate: {:.2}%", rate));
    }
    if let Some(restarts) = inputs.container_restart_count.filter(|r| *r > RESTART_LIMIT) {
        availability.push((100.0 - restarts * 2.0).max(0.0));
        recommendations.push("Multiple container restarts detected".to_string());
    }

    let performance_score = mean(&performance);
    let availability_score = mean(&availability);
    let overall_health = classify(performance_score, availability_score);

    let critical_alerts = if overall_health == OverallHealth::Critical {
        recommendations
            .iter()
            .filter(|r| {
                let lower = r.to_lowercase();
                ALERT_WORDS.iter().any(|w| lower.contains(w))
            })
            .count()
    } else {
        0
    };

    HealthIndicators {
        overall_health,
        critical_alerts,
        performance_score,
        availability_score,
        recommendations,
    }
}
