//! Durations in reports are written as whole milliseconds.

use std::collections::{BTreeMap, HashMap};

use chrono::Duration;
use serde::Serializer;

pub fn duration_ms<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(duration.num_milliseconds())
}

/// Sorted by key so the output is stable.
pub fn duration_map_ms<S: Serializer>(
    map: &HashMap<String, Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(
        map.iter()
            .map(|(task, duration)| (task, duration.num_milliseconds()))
            .collect::<BTreeMap<_, _>>(),
    )
}
