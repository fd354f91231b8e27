use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{
    report::{
        build_report,
        sink::{JsonSink, ReportSink, TerminalSink},
        ReportConfig,
    },
    storage::chunk_storage::ChunkStorageImpl,
    utils::time::week_of,
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(
        long = "start",
        short,
        help = "First day of the report. Examples are \"10-03-2025\", \"yesterday\", \"15/03/2025\""
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "Last day of the report. Examples are \"16-03-2025\", \"today\", \"16/03/2025\""
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long,
        default_value_t = 0.,
        value_parser = parse_smooth,
        help = "How much partially active time counts towards focus time, from 0 (linear) to 1"
    )]
    smooth: f64,
    #[arg(long, help = "Write the report as JSON to this file instead of printing it")]
    json: Option<PathBuf>,
    #[arg(long, help = "Print without colors")]
    no_color: bool,
}

fn parse_smooth(value: &str) -> Result<f64, String> {
    let smooth = value
        .parse::<f64>()
        .map_err(|e| format!("{value:?} is not a number: {e}"))?;
    if (0. ..=1.).contains(&smooth) {
        Ok(smooth)
    } else {
        Err(format!("{smooth} is outside of [0, 1]"))
    }
}

/// Command to process `report` command. Summarizes every day from the start date to the end date.
pub async fn process_report_command(
    ReportCommand {
        start_date,
        end_date,
        date_style,
        smooth,
        json,
        no_color,
    }: ReportCommand,
    app_dir: PathBuf,
) -> Result<()> {
    let today = Local::now().date_naive();
    let start = start_date
        .map(|v| parse_day(&v, date_style, "start"))
        .transpose()?;
    let end = end_date
        .map(|v| parse_day(&v, date_style, "end"))
        .transpose()?;
    let (start, end) = resolve_range(start, end, today);

    let storage = ChunkStorageImpl::new(app_dir.join("records"))?;
    let report = build_report(&storage, &ReportConfig { start, end, smooth }).await?;

    let sink: Box<dyn ReportSink> = match json {
        Some(path) => Box::new(JsonSink { path }),
        None => Box::new(TerminalSink { colored: !no_color }),
    };
    sink.deliver(&report).await
}

/// `DD-MM-YYYY` first, anything else goes through the human date parser.
fn parse_day(value: &str, date_style: DateStyle, which: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%d-%m-%Y") {
        return Ok(date);
    }
    match parse_date_string(value, Local::now(), date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate {which} date {value:?}: {e}"),
            )
            .into()),
    }
}

/// No dates means the current week, a single date means that day alone.
fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    match (start, end) {
        (None, None) => week_of(today),
        (Some(day), None) | (None, Some(day)) => (day, day),
        (Some(start), Some(end)) => (start, end),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_day, parse_smooth, resolve_range, DateStyle};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn range_defaults() {
        let today = d(2025, 3, 13);
        assert_eq!(
            resolve_range(None, None, today),
            (d(2025, 3, 10), d(2025, 3, 16))
        );
        assert_eq!(
            resolve_range(Some(d(2025, 3, 1)), None, today),
            (d(2025, 3, 1), d(2025, 3, 1))
        );
        assert_eq!(
            resolve_range(None, Some(d(2025, 3, 2)), today),
            (d(2025, 3, 2), d(2025, 3, 2))
        );
        assert_eq!(
            resolve_range(Some(d(2025, 3, 1)), Some(d(2025, 3, 5)), today),
            (d(2025, 3, 1), d(2025, 3, 5))
        );
    }

    #[test]
    fn parses_days() {
        assert_eq!(
            parse_day("10-03-2025", DateStyle::Uk, "start").unwrap(),
            d(2025, 3, 10)
        );
        assert_eq!(
            parse_day("15/03/2025", DateStyle::Uk, "start").unwrap(),
            d(2025, 3, 15)
        );
        assert_eq!(
            parse_day("03/15/2025", DateStyle::Us, "start").unwrap(),
            d(2025, 3, 15)
        );
        assert!(parse_day("not a date", DateStyle::Uk, "start").is_err());
    }

    #[test]
    fn smooth_must_be_a_fraction() {
        assert_eq!(parse_smooth("0.4"), Ok(0.4));
        assert!(parse_smooth("1.5").is_err());
        assert!(parse_smooth("-0.1").is_err());
        assert!(parse_smooth("much").is_err());
    }
}
