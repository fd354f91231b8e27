use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use crate::{
    report::summary::UNASSIGNED_TASK,
    session::{tasks::load_tasks, TrackerConfig},
    storage::chunk_storage::{ChunkStorage, ChunkStorageImpl, DayTotals},
    utils::time::{format_clock, local_date},
};

/// Prints the task list next to today's time for each task.
pub async fn process_tasks_command(app_dir: PathBuf) -> Result<()> {
    let config = TrackerConfig::in_dir(app_dir);
    let tasks = load_tasks(&config.tasks_file).await?;
    let storage = ChunkStorageImpl::new(config.records_dir.clone())?;
    let today = local_date(Utc::now());
    let totals = storage
        .load_day_totals(today)
        .await
        .with_context(|| format!("Failed to load totals for {today}"))?;

    if tasks.is_empty() {
        println!("No tasks in {}", config.tasks_file.display());
    }
    let names = tasks.iter().map(|t| t.task_name.as_str()).collect::<Vec<_>>();
    for line in task_lines(&names, &totals) {
        println!("{line}");
    }
    Ok(())
}

fn task_lines(names: &[&str], totals: &DayTotals) -> Vec<String> {
    let time_of = |task: &str| {
        totals
            .by_task
            .get(task)
            .copied()
            .unwrap_or_else(Duration::zero)
    };
    let mut lines = names
        .iter()
        .map(|&name| format!("{}\t{}", format_clock(time_of(name)), name))
        .collect::<Vec<_>>();

    let unassigned = time_of("");
    if unassigned > Duration::zero() {
        lines.push(format!("{}\t{UNASSIGNED_TASK}", format_clock(unassigned)));
    }
    lines.push(format!(
        "{}\tTotal today, active {}",
        format_clock(totals.worked),
        format_clock(totals.active)
    ));
    lines
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Duration;

    use crate::storage::chunk_storage::DayTotals;

    use super::task_lines;

    #[test]
    fn lists_tasks_with_today_time() {
        let totals = DayTotals {
            worked: Duration::minutes(90),
            active: Duration::minutes(60),
            by_task: HashMap::from([
                ("Review".to_string(), Duration::minutes(80)),
                ("".to_string(), Duration::minutes(10)),
            ]),
        };
        assert_eq!(
            task_lines(&["Review", "Docs"], &totals),
            vec![
                "01:20:00\tReview",
                "00:00:00\tDocs",
                "00:10:00\tUnassigned Time",
                "01:30:00\tTotal today, active 01:00:00",
            ]
        );
    }
}
