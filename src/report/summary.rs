use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::storage::entities::Chunk;

use super::ser;

/// Bucket for time tracked without a task.
pub const UNASSIGNED_TASK: &str = "Unassigned Time";

const MIN_ALPHA: f64 = 0.2;

/// Weight of a chunk in the smoothed active total, given its active ratio `f`.
///
/// The ratio is raised to `alpha = 1 - smooth`, kept within `[0.2, 1]`. `smooth = 0` keeps the
/// weight linear, higher values lift partially active chunks.
pub fn smooth_factor(f: f64, smooth: f64) -> f64 {
    if f <= 0. {
        return 0.;
    }
    if f >= 1. {
        return 1.;
    }
    let alpha = (1. - smooth).clamp(MIN_ALPHA, 1.);
    f.powf(alpha)
}

pub(crate) fn task_key(task_name: &str) -> &str {
    if task_name.trim().is_empty() {
        UNASSIGNED_TASK
    } else {
        task_name
    }
}

/// Totals of a single calendar day, derived from its chunks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    #[serde(serialize_with = "ser::duration_ms")]
    pub total_duration: Duration,
    #[serde(serialize_with = "ser::duration_ms")]
    pub total_active: Duration,
    #[serde(serialize_with = "ser::duration_map_ms")]
    pub task_durations: HashMap<String, Duration>,
    #[serde(serialize_with = "ser::duration_ms")]
    pub smoothed_active_time: Duration,
}

impl DaySummary {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_duration: Duration::zero(),
            total_active: Duration::zero(),
            task_durations: HashMap::new(),
            smoothed_active_time: Duration::zero(),
        }
    }

    pub fn from_chunks<'a>(
        date: NaiveDate,
        chunks: impl IntoIterator<Item = &'a Chunk>,
        smooth: f64,
    ) -> Self {
        let mut summary = Self::empty(date);
        for chunk in chunks {
            summary.add(chunk, smooth);
        }
        summary
    }

    fn add(&mut self, chunk: &Chunk, smooth: f64) {
        let duration = chunk.duration();
        let active = chunk.active_time.clamp(Duration::zero(), duration.max(Duration::zero()));

        self.total_duration += duration;
        self.total_active += active;
        *self
            .task_durations
            .entry(task_key(&chunk.task_name).to_owned())
            .or_insert_with(Duration::zero) += duration;

        let weight = smooth_factor(ratio(active, duration), smooth);
        self.smoothed_active_time += scale(duration, weight);
    }
}

fn ratio(part: Duration, whole: Duration) -> f64 {
    match (part.num_nanoseconds(), whole.num_nanoseconds()) {
        (Some(part), Some(whole)) if whole > 0 => part as f64 / whole as f64,
        _ => 0.,
    }
}

/// `duration * weight` at nanosecond precision. A chunk never spans anywhere near 292 years, so
/// the nanosecond count always fits.
fn scale(duration: Duration, weight: f64) -> Duration {
    duration
        .num_nanoseconds()
        .map(|nanos| Duration::nanoseconds((nanos as f64 * weight).round() as i64))
        .unwrap_or_else(Duration::zero)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate};

    use crate::storage::entities::Chunk;

    use super::{smooth_factor, DaySummary, UNASSIGNED_TASK};

    fn chunk(task: &str, start: &str, end: &str, active: Duration) -> Chunk {
        let parse = |s: &str| DateTime::<FixedOffset>::parse_from_rfc3339(s).unwrap();
        Chunk {
            task_name: task.into(),
            started_at: parse(start),
            finished_at: parse(end),
            active_time: active,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn smooth_factor_bounds() {
        for smooth in [0., 0.3, 0.8, 1.] {
            assert_eq!(smooth_factor(0., smooth), 0.);
            assert_eq!(smooth_factor(-0.5, smooth), 0.);
            assert_eq!(smooth_factor(1., smooth), 1.);
            assert_eq!(smooth_factor(1.5, smooth), 1.);
        }
        assert_eq!(smooth_factor(0.5, 0.), 0.5);
        assert!((smooth_factor(0.5, 1.) - 0.8706).abs() < 1e-4);
        // alpha is floored at 0.2 and capped at 1.
        assert_eq!(smooth_factor(0.5, 0.9), smooth_factor(0.5, 1.));
        assert_eq!(smooth_factor(0.5, -1.), 0.5);
    }

    #[test]
    fn summarizes_two_tasks() {
        let chunks = [
            chunk(
                "A",
                "2025-03-10T09:00:00+00:00",
                "2025-03-10T10:00:00+00:00",
                Duration::minutes(30),
            ),
            chunk(
                "B",
                "2025-03-10T10:00:00+00:00",
                "2025-03-10T10:30:00+00:00",
                Duration::minutes(30),
            ),
        ];
        let summary = DaySummary::from_chunks(date(), &chunks, 0.);

        assert_eq!(summary.total_duration, Duration::minutes(90));
        assert_eq!(summary.total_active, Duration::minutes(60));
        assert_eq!(summary.task_durations.len(), 2);
        assert_eq!(summary.task_durations["A"], Duration::minutes(60));
        assert_eq!(summary.task_durations["B"], Duration::minutes(30));
        // Linear weights: 60m * 0.5 + 30m * 1.
        assert_eq!(summary.smoothed_active_time, Duration::minutes(60));
    }

    #[test]
    fn smoothing_lifts_partial_activity() {
        let chunks = [chunk(
            "A",
            "2025-03-10T09:00:00+00:00",
            "2025-03-10T10:00:00+00:00",
            Duration::minutes(30),
        )];
        let linear = DaySummary::from_chunks(date(), &chunks, 0.);
        let smoothed = DaySummary::from_chunks(date(), &chunks, 1.);
        assert_eq!(linear.smoothed_active_time, Duration::minutes(30));
        assert!(smoothed.smoothed_active_time > Duration::minutes(52));
        assert!(smoothed.smoothed_active_time < Duration::minutes(53));
    }

    #[test]
    fn empty_task_goes_to_unassigned() {
        let chunks = [chunk(
            "",
            "2025-03-10T09:00:00+00:00",
            "2025-03-10T09:10:00+00:00",
            Duration::minutes(20),
        )];
        let summary = DaySummary::from_chunks(date(), &chunks, 0.);
        assert_eq!(summary.task_durations[UNASSIGNED_TASK], Duration::minutes(10));
        // Active time is clamped to the interval.
        assert_eq!(summary.total_active, Duration::minutes(10));
    }

    #[test]
    fn blank_task_goes_to_unassigned() {
        let chunks = [
            chunk(
                "   ",
                "2025-03-10T09:00:00+00:00",
                "2025-03-10T09:10:00+00:00",
                Duration::zero(),
            ),
            chunk(
                "",
                "2025-03-10T09:10:00+00:00",
                "2025-03-10T09:30:00+00:00",
                Duration::zero(),
            ),
        ];
        let summary = DaySummary::from_chunks(date(), &chunks, 0.);
        assert_eq!(summary.task_durations.len(), 1);
        assert_eq!(summary.task_durations[UNASSIGNED_TASK], Duration::minutes(30));
    }

    #[test]
    fn no_chunks_is_zero() {
        let summary = DaySummary::from_chunks(date(), &[], 0.5);
        assert_eq!(summary, DaySummary::empty(date()));
    }
}
