use std::path::PathBuf;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, Utc};

/// This is the standard way of converting a date to a day file in worktracker:
/// `<year>/<month>/<day>_<month>_<year>.jsonl`, for example `2026/january/23_january_2026.jsonl`.
pub fn date_to_record_path(date: NaiveDate) -> PathBuf {
    let year = date.format("%Y").to_string();
    let month = date.format("%B").to_string().to_lowercase();
    let file_name = format!("{}_{month}_{year}.jsonl", date.format("%d"));
    [year, month, file_name].iter().collect()
}

/// Instants are stored with the local offset so the files stay readable by hand.
pub fn to_local(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&Local).fixed_offset()
}

pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Monday and Sunday of the week containing `date`.
pub fn week_of(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(6))
}

/// Clock-like `HH:MM:SS`, used for live totals.
pub fn format_clock(v: Duration) -> String {
    let seconds = v.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Compact `1h2m3s` form, used in reports.
pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds().max(0) % 60)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{Duration, NaiveDate};

    use super::{date_to_record_path, format_clock, format_duration, week_of};

    #[test]
    fn record_path_is_hierarchical() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert_eq!(
            date_to_record_path(date),
            PathBuf::from("2026/january/03_january_2026.jsonl")
        );
    }

    #[test]
    fn week_runs_monday_to_sunday() {
        // 2025-03-13 is a Thursday.
        let (monday, sunday) = week_of(NaiveDate::from_ymd_opt(2025, 3, 13).unwrap());
        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(sunday, NaiveDate::from_ymd_opt(2025, 3, 16).unwrap());

        let (monday, _) = week_of(NaiveDate::from_ymd_opt(2025, 3, 16).unwrap());
        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }

    #[test]
    fn formats() {
        assert_eq!(format_clock(Duration::seconds(3723)), "01:02:03");
        assert_eq!(format_clock(Duration::seconds(-5)), "00:00:00");
        assert_eq!(format_duration(Duration::seconds(3723)), "1h2m3s");
        assert_eq!(format_duration(Duration::seconds(63)), "1m3s");
        assert_eq!(format_duration(Duration::seconds(7)), "7s");
    }
}
