use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Duration;
use tokio::process::Command;
use tracing::instrument;

use super::IdleSource;

/// Asks the `xprintidle` utility, which prints milliseconds since the last input.
pub struct XprintidleSource;

#[async_trait]
impl IdleSource for XprintidleSource {
    #[instrument(skip(self))]
    async fn idle_time(&mut self) -> Result<Duration> {
        // Dropped on timeout, so the child must not outlive the future.
        let output = Command::new("xprintidle")
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to run xprintidle")?;
        if !output.status.success() {
            return Err(anyhow!("xprintidle exited with {}", output.status));
        }
        parse_idle_output(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_idle_output(output: &str) -> Result<Duration> {
    let ms = output
        .trim()
        .parse::<i64>()
        .with_context(|| format!("Unexpected xprintidle output {output:?}"))?;
    Ok(Duration::milliseconds(ms))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::parse_idle_output;

    #[test]
    fn parses_milliseconds() {
        assert_eq!(
            parse_idle_output("1234\n").unwrap(),
            Duration::milliseconds(1234)
        );
        assert!(parse_idle_output("").is_err());
        assert!(parse_idle_output("idle").is_err());
    }
}
