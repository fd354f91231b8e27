use std::{fmt::Write, path::PathBuf};

use ansi_term::{Colour, Style};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::utils::{percentage::activity_percentage, time::format_duration};

use super::{
    palette::{activity_color, Rgb},
    Report,
};

/// Destination of a finished report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, report: &Report) -> Result<()>;
}

/// Prints the report as a table, each task marked with its color.
pub struct TerminalSink {
    pub colored: bool,
}

impl TerminalSink {
    fn paint(&self, color: Rgb, text: &str) -> String {
        if self.colored {
            Colour::RGB(color.0, color.1, color.2).paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.colored {
            Style::new().bold().paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn render(&self, report: &Report) -> String {
        let totals = &report.totals;
        let mut out = String::new();
        let average = activity_percentage(totals.total_active, totals.total_worked);

        // Writing into a String can't fail.
        let _ = writeln!(out, "{}", self.bold(&report.title));
        let _ = writeln!(
            out,
            "Worked {}\tActive {} ({})\tFocus {}",
            format_duration(totals.total_worked),
            format_duration(totals.total_active),
            self.paint(activity_color(*average), &average.to_string()),
            format_duration(totals.smoothed_active),
        );

        if !totals.task_order.is_empty() {
            let _ = writeln!(out, "\n{}", self.bold("Tasks"));
        }
        for task in &totals.task_order {
            let duration = totals.per_task_totals[task];
            let color = totals.task_colors[task];
            let _ = writeln!(
                out,
                "{} {}\t{}\t{}",
                self.paint(color, "■"),
                format_duration(duration),
                activity_percentage(duration, totals.total_worked),
                task
            );
        }

        let _ = writeln!(out, "\n{}", self.bold("Days"));
        for day in &report.days {
            let activity = activity_percentage(day.total_active, day.total_duration);
            let _ = writeln!(
                out,
                "{}\t{}\t{}\tfocus {}",
                day.date.format("%a %d %b"),
                format_duration(day.total_duration),
                self.paint(activity_color(*activity), &activity.to_string()),
                format_duration(day.smoothed_active_time),
            );
        }
        out
    }
}

#[async_trait]
impl ReportSink for TerminalSink {
    async fn deliver(&self, report: &Report) -> Result<()> {
        print!("{}", self.render(report));
        Ok(())
    }
}

/// Writes the report as pretty JSON.
pub struct JsonSink {
    pub path: PathBuf,
}

#[async_trait]
impl ReportSink for JsonSink {
    async fn deliver(&self, report: &Report) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(report)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        info!("Report written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate};
    use tempfile::tempdir;

    use crate::report::{summary::DaySummary, PeriodTotals, Report};

    use super::{JsonSink, ReportSink, TerminalSink};

    fn report() -> Report {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut day = DaySummary::empty(date);
        day.total_duration = Duration::minutes(90);
        day.total_active = Duration::minutes(45);
        day.smoothed_active_time = Duration::minutes(45);
        day.task_durations.insert("A".into(), Duration::minutes(60));
        day.task_durations.insert("B".into(), Duration::minutes(30));
        let totals = PeriodTotals::from_days(&[day.clone()]);
        Report {
            title: "Daily Report: 10 Mar 2025".into(),
            start: date,
            end: date,
            smooth: 0.,
            totals,
            days: vec![day],
        }
    }

    #[test]
    fn renders_plain_table() {
        let text = TerminalSink { colored: false }.render(&report());
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Daily Report: 10 Mar 2025");
        assert_eq!(lines[1], "Worked 1h30m0s\tActive 45m0s (50%)\tFocus 45m0s");
        assert_eq!(lines[3], "Tasks");
        assert_eq!(lines[4], "■ 1h0m0s\t67%\tA");
        assert_eq!(lines[5], "■ 30m0s\t33%\tB");
        assert_eq!(lines[8], "Mon 10 Mar\t1h30m0s\t50%\tfocus 45m0s");
    }

    #[tokio::test]
    async fn json_sink_creates_directories() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested/report.json");
        JsonSink { path: path.clone() }.deliver(&report()).await?;

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        assert_eq!(value["totals"]["total_worked"], 90 * 60 * 1000);
        assert_eq!(value["totals"]["task_order"][0], "A");
        assert_eq!(value["days"][0]["date"], "2025-03-10");
        assert_eq!(value["days"][0]["task_durations"]["B"], 30 * 60 * 1000);
        assert!(value["totals"]["task_colors"]["A"]
            .as_str()
            .is_some_and(|c| c.starts_with('#')));
        Ok(())
    }
}
