//! Aggregation of the chunk log into day and period summaries.

pub mod palette;
pub mod ser;
pub mod sink;
pub mod summary;
pub mod title;

use std::{collections::HashMap, future};

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use futures::{stream, Stream, StreamExt, TryStreamExt};
use palette::{task_color, Rgb};
use serde::Serialize;
use summary::{DaySummary, UNASSIGNED_TASK};
use tracing::{info, instrument};

use crate::storage::chunk_storage::ChunkStorage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub smooth: f64,
}

/// Roll-up of a range of days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotals {
    #[serde(serialize_with = "ser::duration_ms")]
    pub total_worked: Duration,
    #[serde(serialize_with = "ser::duration_ms")]
    pub total_active: Duration,
    #[serde(serialize_with = "ser::duration_ms")]
    pub smoothed_active: Duration,
    #[serde(serialize_with = "ser::duration_map_ms")]
    pub per_task_totals: HashMap<String, Duration>,
    /// Longest first, ties by name. Unassigned time always leads.
    pub task_order: Vec<String>,
    pub task_colors: HashMap<String, Rgb>,
}

impl PeriodTotals {
    pub fn from_days(days: &[DaySummary]) -> Self {
        let mut per_task_totals = HashMap::<String, Duration>::new();
        let mut total_worked = Duration::zero();
        let mut total_active = Duration::zero();
        let mut smoothed_active = Duration::zero();
        for day in days {
            total_worked += day.total_duration;
            total_active += day.total_active;
            smoothed_active += day.smoothed_active_time;
            for (task, duration) in &day.task_durations {
                *per_task_totals
                    .entry(task.clone())
                    .or_insert_with(Duration::zero) += *duration;
            }
        }

        let task_order = rank_tasks(&per_task_totals);
        let task_colors = assign_colors(&task_order);
        Self {
            total_worked,
            total_active,
            smoothed_active,
            per_task_totals,
            task_order,
            task_colors,
        }
    }
}

fn rank_tasks(totals: &HashMap<String, Duration>) -> Vec<String> {
    let mut order = totals.keys().cloned().collect::<Vec<_>>();
    order.sort_by(|a, b| {
        (b == UNASSIGNED_TASK)
            .cmp(&(a == UNASSIGNED_TASK))
            .then_with(|| totals[b].cmp(&totals[a]))
            .then_with(|| a.cmp(b))
    });
    order
}

/// The neutral slot 0 belongs to unassigned time whether or not it shows up, so the other tasks
/// keep their colors between ranges with and without it.
fn assign_colors(task_order: &[String]) -> HashMap<String, Rgb> {
    let mut colors = HashMap::new();
    let mut next_slot = 1;
    for task in task_order {
        let slot = if task == UNASSIGNED_TASK {
            0
        } else {
            next_slot += 1;
            next_slot - 1
        };
        colors.insert(task.clone(), task_color(slot, task));
    }
    colors
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub smooth: f64,
    pub totals: PeriodTotals,
    pub days: Vec<DaySummary>,
}

/// Reads every day of `[start, end]` and summarizes it. Broken lines are skipped, but a file
/// that exists and can't be read fails the whole report.
#[instrument(skip(storage))]
pub async fn build_report(storage: &impl ChunkStorage, config: &ReportConfig) -> Result<Report> {
    let ReportConfig { start, end, smooth } = *config;
    if start > end {
        bail!("Report start {start} is after its end {end}");
    }

    let days = date_range(start, end)
        .then(|day| async move {
            let chunks = storage
                .read_day(day)
                .await
                .with_context(|| format!("Failed to read records for {day}"))?;
            anyhow::Ok(DaySummary::from_chunks(day, &chunks, smooth))
        })
        .try_collect::<Vec<_>>()
        .await?;

    let totals = PeriodTotals::from_days(&days);
    info!(
        "Built report for {} days, {} tasks",
        days.len(),
        totals.task_order.len()
    );
    Ok(Report {
        title: title::report_title(start, end),
        start,
        end,
        smooth,
        totals,
        days,
    })
}

/// Returns a stream of dates between start (inclusive) and end (inclusive).
fn date_range(start: NaiveDate, end: NaiveDate) -> impl Stream<Item = NaiveDate> {
    stream::unfold(Some(start), move |current| {
        future::ready(
            current
                .filter(|day| *day <= end)
                .map(|day| (day, day.succ_opt())),
        )
    })
}
