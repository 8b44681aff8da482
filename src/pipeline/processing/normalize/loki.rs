use std::collections::BTreeMap;
use tracing::debug;

use super::{merge_embedded_json, nanos_to_millis, parse_nanos};
use crate::pipeline::ingestion::responses::{label_value, LokiRawResponse};
use crate::types::{CanonicalLogRecord, LogSource};

/// Stream labels apply to every value of the stream
pub fn normalize(resp: &LokiRawResponse) -> Vec<CanonicalLogRecord> {
    let mut records = Vec::new();

    for stream in resp.streams() {
        let labels: BTreeMap<String, String> = stream
            .stream
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), label_value(v)))
            .collect();

        for entry in stream.values.iter().flatten() {
            let Some(pair) = entry.as_array() else {
                debug!("skipping Loki value that is not a [ts, line] pair");
                continue;
            };
            let timestamp_ns = pair.first().map(parse_nanos).unwrap_or(0);
            let line = pair.get(1).map(label_value).unwrap_or_default();

            let mut record = CanonicalLogRecord::new(nanos_to_millis(timestamp_ns), line, LogSource::Loki);
            record.labels = labels.clone();
            merge_embedded_json(&mut record);
            records.push(record);
        }
    }

    records
}
