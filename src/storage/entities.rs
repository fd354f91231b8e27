use chrono::{DateTime, Datelike, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::error::ChunkError;

/// One line of a day file. A chunk says that `task_name` was tracked from `started_at` to
/// `finished_at`, and that the user was active for `active_time` of that span. Chunks are only
/// ever appended, a correction is a new chunk.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Chunk {
    /// Empty when the time was tracked without a task.
    #[serde(default)]
    pub task_name: String,
    #[serde(default = "zero_instant")]
    pub started_at: DateTime<FixedOffset>,
    #[serde(default = "zero_instant")]
    pub finished_at: DateTime<FixedOffset>,
    #[serde(with = "active_time_ser", default = "Duration::zero")]
    pub active_time: Duration,
}

impl Chunk {
    /// Builds a chunk for a closed interval. The interval must not be empty and active time is
    /// clamped into `[0, duration]`.
    pub fn new(
        task_name: impl Into<String>,
        started_at: DateTime<FixedOffset>,
        finished_at: DateTime<FixedOffset>,
        active_time: Duration,
    ) -> Result<Self, ChunkError> {
        if finished_at <= started_at {
            return Err(ChunkError::InvalidInterval {
                started_at,
                finished_at,
            });
        }
        let duration = finished_at - started_at;
        Ok(Self {
            task_name: task_name.into(),
            started_at,
            finished_at,
            active_time: active_time.clamp(Duration::zero(), duration),
        })
    }

    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }

    /// Checks the invariants a chunk read back from disk has to hold.
    pub fn validate(&self) -> Result<(), ChunkError> {
        self.validate_window()?;
        let duration = self.duration();
        if self.active_time < Duration::zero() || self.active_time > duration {
            return Err(ChunkError::InvalidActiveTime {
                active_time: self.active_time,
                duration,
            });
        }
        Ok(())
    }

    /// Only checks the time window. Active time outside of it is left for the reader to clamp.
    pub fn validate_window(&self) -> Result<(), ChunkError> {
        if is_zero_instant(&self.started_at) {
            return Err(ChunkError::ZeroTimestamp { field: "started_at" });
        }
        if is_zero_instant(&self.finished_at) {
            return Err(ChunkError::ZeroTimestamp {
                field: "finished_at",
            });
        }
        if self.finished_at <= self.started_at {
            return Err(ChunkError::InvalidInterval {
                started_at: self.started_at,
                finished_at: self.finished_at,
            });
        }
        Ok(())
    }
}

fn zero_instant() -> DateTime<FixedOffset> {
    DateTime::<Utc>::MIN_UTC.fixed_offset()
}

/// Older writers emitted `0001-01-01T00:00:00Z` for an unset instant.
fn is_zero_instant(instant: &DateTime<FixedOffset>) -> bool {
    instant.year() <= 1
}

/// Active time is written as integer nanoseconds. Reading also accepts duration strings such as
/// `"1h2m3.5s"` or `"999ms"`, and integers wrapped in a string.
mod active_time_ser {
    use chrono::Duration;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::parse_go_duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_nanoseconds().unwrap_or(i64::MAX))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawActiveTime {
        Nanos(i64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawActiveTime::deserialize(deserializer)? {
            RawActiveTime::Nanos(nanos) => Ok(Duration::nanoseconds(nanos)),
            RawActiveTime::Text(text) => parse_go_duration(&text)
                .or_else(|| text.trim().parse::<i64>().ok().map(Duration::nanoseconds))
                .ok_or_else(|| de::Error::custom(format!("invalid active time {text:?}"))),
        }
    }
}

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Parses durations in the `72h3m0.5s` notation: an optional sign followed by one or more
/// decimal numbers, each with a unit out of `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`.
pub fn parse_go_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (negative, mut rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if rest == "0" {
        return Some(Duration::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let whole_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let whole = &rest[..whole_len];
        rest = &rest[whole_len..];

        let mut fraction = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let fraction_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            fraction = &after_dot[..fraction_len];
            rest = &after_dot[fraction_len..];
        }
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit: i128 = match &rest[..unit_len] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3600 * NANOS_PER_SECOND,
            _ => return None,
        };
        rest = &rest[unit_len..];

        if !whole.is_empty() {
            total += whole.parse::<i128>().ok()?.checked_mul(unit)?;
        }
        if !fraction.is_empty() {
            let digits = &fraction[..fraction.len().min(18)];
            let scale = 10i128.pow(digits.len() as u32);
            total += digits.parse::<i128>().ok()? * unit / scale;
        }
        if total > i64::MAX as i128 {
            return None;
        }
    }

    let total = if negative { -total } else { total };
    Some(Duration::nanoseconds(total as i64))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset};

    use super::{parse_go_duration, Chunk};
    use crate::storage::error::ChunkError;

    fn instant(text: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(text).unwrap()
    }

    #[test]
    fn new_clamps_active_time_into_interval() {
        let chunk = Chunk::new(
            "A",
            instant("2025-03-10T09:00:00+02:00"),
            instant("2025-03-10T09:00:10+02:00"),
            Duration::seconds(15),
        )
        .unwrap();
        assert_eq!(chunk.active_time, Duration::seconds(10));

        let chunk = Chunk::new(
            "A",
            instant("2025-03-10T09:00:00+02:00"),
            instant("2025-03-10T09:00:10+02:00"),
            Duration::seconds(-3),
        )
        .unwrap();
        assert_eq!(chunk.active_time, Duration::zero());
    }

    #[test]
    fn new_rejects_empty_interval() {
        let at = instant("2025-03-10T09:00:00+02:00");
        let result = Chunk::new("A", at, at, Duration::zero());
        assert!(matches!(result, Err(ChunkError::InvalidInterval { .. })));
    }

    #[test]
    fn numeric_and_string_active_time_decode_to_the_same_value() {
        let numeric = r#"{"task_name":"A","started_at":"2025-03-10T09:00:00+02:00","finished_at":"2025-03-10T10:00:00+02:00","active_time":1800000000000}"#;
        let text = r#"{"task_name":"A","started_at":"2025-03-10T09:00:00+02:00","finished_at":"2025-03-10T10:00:00+02:00","active_time":"30m0s"}"#;
        let numeric: Chunk = serde_json::from_str(numeric).unwrap();
        let text: Chunk = serde_json::from_str(text).unwrap();
        assert_eq!(numeric, text);
        assert_eq!(numeric.active_time, Duration::minutes(30));
    }

    #[test]
    fn serialized_chunk_reads_back_exactly() {
        let chunk = Chunk::new(
            "",
            instant("2025-03-10T09:00:00.123456789-05:00"),
            instant("2025-03-10T09:00:09.987654321-05:00"),
            Duration::nanoseconds(4_000_000_123),
        )
        .unwrap();
        let line = serde_json::to_string(&chunk).unwrap();
        assert!(!line.contains('\n'));
        let decoded: Chunk = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded, chunk);
        assert_eq!(decoded.duration(), chunk.duration());
    }

    #[test]
    fn missing_timestamp_is_rejected_by_validation() {
        let line = r#"{"task_name":"A","finished_at":"2025-03-10T10:00:00Z","active_time":0}"#;
        let chunk: Chunk = serde_json::from_str(line).unwrap();
        assert!(matches!(
            chunk.validate(),
            Err(ChunkError::ZeroTimestamp { field: "started_at" })
        ));

        let line = r#"{"task_name":"A","started_at":"0001-01-01T00:00:00Z","finished_at":"2025-03-10T10:00:00Z","active_time":0}"#;
        let chunk: Chunk = serde_json::from_str(line).unwrap();
        assert!(matches!(
            chunk.validate(),
            Err(ChunkError::ZeroTimestamp { .. })
        ));
    }

    #[test]
    fn validate_rejects_active_time_outside_interval() {
        let line = r#"{"task_name":"A","started_at":"2025-03-10T09:00:00Z","finished_at":"2025-03-10T09:00:01Z","active_time":"2s"}"#;
        let chunk: Chunk = serde_json::from_str(line).unwrap();
        assert!(matches!(
            chunk.validate(),
            Err(ChunkError::InvalidActiveTime { .. })
        ));
    }

    #[test]
    fn window_check_ignores_active_time() {
        let line = r#"{"task_name":"A","started_at":"2025-03-10T09:00:00Z","finished_at":"2025-03-10T09:00:01Z","active_time":"2s"}"#;
        let chunk: Chunk = serde_json::from_str(line).unwrap();
        assert_eq!(chunk.validate_window(), Ok(()));

        let line = r#"{"task_name":"A","started_at":"2025-03-10T09:00:01Z","finished_at":"2025-03-10T09:00:01Z","active_time":0}"#;
        let chunk: Chunk = serde_json::from_str(line).unwrap();
        assert!(matches!(
            chunk.validate_window(),
            Err(ChunkError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn parses_duration_notation() {
        assert_eq!(parse_go_duration("0"), Some(Duration::zero()));
        assert_eq!(parse_go_duration("999ms"), Some(Duration::milliseconds(999)));
        assert_eq!(parse_go_duration("1.23s"), Some(Duration::milliseconds(1230)));
        assert_eq!(
            parse_go_duration("1h2m3.5s"),
            Some(Duration::milliseconds(3_723_500))
        );
        assert_eq!(parse_go_duration("250µs"), Some(Duration::microseconds(250)));
        assert_eq!(parse_go_duration("-1m"), Some(Duration::minutes(-1)));
        assert_eq!(parse_go_duration("12"), None);
        assert_eq!(parse_go_duration("1x"), None);
        assert_eq!(parse_go_duration(""), None);
        assert_eq!(parse_go_duration(".s"), None);
    }

    #[test]
    fn integer_string_is_nanoseconds() {
        let line = r#"{"task_name":"A","started_at":"2025-03-10T09:00:00Z","finished_at":"2025-03-10T09:00:01Z","active_time":"500000000"}"#;
        let chunk: Chunk = serde_json::from_str(line).unwrap();
        assert_eq!(chunk.active_time, Duration::milliseconds(500));
    }
}
