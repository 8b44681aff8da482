use std::collections::HashSet;
use tracing::debug;

use crate::observability::metrics;
use crate::types::CanonicalLogRecord;

/// Drop repeated (timestamp_ms, message) pairs, keeping the first one seen,
/// then order newest first. Both steps are stable.
pub fn dedup_and_sort(records: Vec<CanonicalLogRecord>) -> Vec<CanonicalLogRecord> {
    let before = records.len();
    let mut seen: HashSet<(u64, String)> = HashSet::with_capacity(before);
    let mut unique: Vec<CanonicalLogRecord> = records
        .into_iter()
        .filter(|r| seen.insert((r.timestamp_ms, r.message.clone())))
        .collect();

    let dropped = before - unique.len();
    if dropped > 0 {
        debug!("Dropped {} duplicate records", dropped);
        metrics::dedup::dropped(dropped);
    }

    // sort_by is stable, ties keep input order
    unique.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    unique
}
