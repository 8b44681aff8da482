/// Backend defaults and fixed query tables shared across the loaders

// Environment variable names
pub const LOKI_ENDPOINT_ENV: &str = "LOKI_ENDPOINT";
pub const QUICKWIT_ENDPOINT_ENV: &str = "QUICKWIT_ENDPOINT";
pub const PROMETHEUS_ENDPOINT_ENV: &str = "PROMETHEUS_ENDPOINT";
pub const LOG_DIR_ENV: &str = "OBS_LOG_DIR";
pub const PUSHGATEWAY_URL_ENV: &str = "OBS_PUSHGATEWAY_URL";
pub const UTC_OFFSET_ENV: &str = "OBS_UTC_OFFSET_MINUTES";

// Default endpoints
pub const DEFAULT_LOKI_ENDPOINT: &str = "http://localhost:3100";
pub const DEFAULT_QUICKWIT_ENDPOINT: &str = "http://localhost:7280";
pub const DEFAULT_PROMETHEUS_ENDPOINT: &str = "http://localhost:9090";

// Backend API paths
pub const LOKI_QUERY_RANGE_PATH: &str = "/loki/api/v1/query_range";
pub const PROMETHEUS_QUERY_PATH: &str = "/api/v1/query";

pub const DEFAULT_LOKI_QUERY: &str = r#"{job=~".+"}"#;
pub const DEFAULT_QUICKWIT_INDEX: &str = "otel-logs-v0_7";

/// Sub-queries pooled for one Quickwit run, evaluated as a logical OR
pub const DEFAULT_QUICKWIT_QUERIES: [&str; 4] = [
    "*",
    "log_type:security",
    "severity_text:ERROR OR severity_text:WARNING",
    "body:(auth OR login OR failed OR unauthorized OR denied OR firewall)",
];

pub const DEFAULT_HOURS_BACK: i64 = 2;
pub const DEFAULT_LOKI_LIMIT: usize = 1000;
pub const DEFAULT_QUICKWIT_MAX_HITS: usize = 1000;
pub const DEFAULT_MAX_EMITTED_LOGS: usize = 50;

pub const PUSHGATEWAY_JOB: &str = "observable_loaders";

/// Label used when a record carries no service information
pub const UNKNOWN: &str = "unknown";

pub const SYSTEM_METRIC_QUERIES: [(&str, &str); 7] = [
    ("cpu_usage", r#"avg(1 - rate(node_cpu_seconds_total{mode="idle"}[5m])) * 100"#),
    ("memory_usage", "avg((1 - (node_memory_MemAvailable_bytes / node_memory_MemTotal_bytes)) * 100)"),
    ("disk_usage", "avg((1 - (node_filesystem_avail_bytes / node_filesystem_size_bytes)) * 100)"),
    ("network_in", "avg(rate(node_network_receive_bytes_total[5m])) * 8"),
    ("network_out", "avg(rate(node_network_transmit_bytes_total[5m])) * 8"),
    ("load_average", "avg(node_load1)"),
    ("uptime", "avg(node_time_seconds - node_boot_time_seconds)"),
];

pub const APPLICATION_METRIC_QUERIES: [(&str, &str); 7] = [
    ("http_requests_total", "sum(rate(http_requests_total[5m]))"),
    ("http_request_duration", "avg(http_request_duration_seconds)"),
    ("active_connections", "sum(nginx_connections_active)"),
    (
        "error_rate",
        r#"sum(rate(http_requests_total{status=~"5.."}[5m])) / sum(rate(http_requests_total[5m])) * 100"#,
    ),
    ("response_time_p95", "histogram_quantile(0.95, rate(http_request_duration_seconds_bucket[5m]))"),
    ("database_connections", "sum(mysql_global_status_threads_connected)"),
    (
        "cache_hit_rate",
        "rate(redis_keyspace_hits_total[5m]) / (rate(redis_keyspace_hits_total[5m]) + rate(redis_keyspace_misses_total[5m])) * 100",
    ),
];

pub const OBSERVABILITY_METRIC_QUERIES: [(&str, &str); 11] = [
    ("pod_count", "count(kube_pod_info)"),
    ("namespace_count", "count(count by (namespace)(kube_pod_info))"),
    ("service_count", "count(kube_service_info)"),
    ("deployment_count", "count(kube_deployment_labels)"),
    ("container_cpu_usage", "avg(rate(container_cpu_usage_seconds_total[5m])) * 100"),
    (
        "container_memory_usage",
        "avg(container_memory_working_set_bytes / container_spec_memory_limit_bytes) * 100",
    ),
    ("container_restart_count", "sum(increase(kube_pod_container_status_restarts_total[1h]))"),
    ("grafana_active_users", "grafana_stat_active_users"),
    ("loki_ingester_chunks", "sum(loki_ingester_chunks_stored_total)"),
    ("prometheus_targets", "prometheus_config_last_reload_success_timestamp_seconds"),
    ("alertmanager_alerts", "sum(alertmanager_alerts)"),
];
