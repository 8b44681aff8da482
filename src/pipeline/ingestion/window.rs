use chrono::{DateTime, Duration, Utc};

const MAX_HOURS_BACK: i64 = 24 * 365;

/// Time window and row limit for one run, converted to each backend's unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: usize,
}

impl QueryWindow {
    /// The `hours_back` hours ending now
    pub fn last_hours(hours_back: i64, limit: usize) -> Self {
        Self::ending_at(Utc::now(), hours_back, limit)
    }

    pub fn ending_at(end: DateTime<Utc>, hours_back: i64, limit: usize) -> Self {
        let hours = hours_back.clamp(0, MAX_HOURS_BACK);
        Self {
            start: end - Duration::hours(hours),
            end,
            limit,
        }
    }

    /// Loki wants nanoseconds
    pub fn start_nanos(&self) -> i64 {
        to_nanos(&self.start)
    }

    pub fn end_nanos(&self) -> i64 {
        to_nanos(&self.end)
    }

    /// Quickwit wants seconds
    pub fn start_secs(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_secs(&self) -> i64 {
        self.end.timestamp()
    }
}

fn to_nanos(at: &DateTime<Utc>) -> i64 {
    at.timestamp() * 1_000_000_000 + i64::from(at.timestamp_subsec_nanos())
}
