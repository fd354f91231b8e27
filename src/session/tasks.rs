use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A task the user prepared in advance. Only the name takes part in tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_name: String,
    #[serde(default)]
    pub task_description: String,
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// Reads the task list. A missing file means there are no tasks yet.
pub async fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let tasks: Vec<Task> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!("Loaded {} tasks from {}", tasks.len(), path.display());
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::load_tasks;

    #[tokio::test]
    async fn missing_file_means_no_tasks() -> Result<()> {
        let dir = tempdir()?;
        assert!(load_tasks(&dir.path().join("tasks.json")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn reads_task_list() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tasks.json");
        std::fs::write(
            &path,
            r#"[
                {"task_name": "Review", "task_description": "PRs", "created_at": "2025-03-10T09:00:00+02:00"},
                {"task_name": "Docs"}
            ]"#,
        )?;

        let tasks = load_tasks(&path).await?;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task_name, "Review");
        assert_eq!(tasks[0].task_description, "PRs");
        assert!(tasks[0].created_at.is_some());
        assert_eq!(tasks[1].task_description, "");
        assert_eq!(tasks[1].created_at, None);
        Ok(())
    }

    #[tokio::test]
    async fn broken_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{not a list")?;
        assert!(load_tasks(&path).await.is_err());
        Ok(())
    }
}
