use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, oneshot},
};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tracing::{debug, error};

use crate::{
    probe::GenericProbe,
    session::{intent::Intent, start_session, state::SessionSnapshot, TrackerConfig},
    utils::{clock::DefaultClock, time::format_clock},
};

#[derive(Debug, Parser)]
pub struct TrackCommand {
    #[arg(long, short, help = "Start tracking this task right away")]
    task: Option<String>,
    #[arg(long, default_value_t = 1, help = "Seconds between activity samples")]
    activity_interval: u64,
    #[arg(long, default_value_t = 10, help = "Seconds between writes to the day file")]
    flush_interval: u64,
}

const HELP: &str = "Commands: start [task], stop, switch <task>, status, quit";

/// A line typed into the tracking console.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleCommand {
    Start(Option<String>),
    Stop,
    Switch(String),
    Status,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let task = (!rest.is_empty()).then(|| rest.to_string());
    match (word, task) {
        ("start", task) => Some(ConsoleCommand::Start(task)),
        ("stop", None) => Some(ConsoleCommand::Stop),
        ("switch", Some(task)) => Some(ConsoleCommand::Switch(task)),
        ("status" | "", None) => Some(ConsoleCommand::Status),
        ("quit" | "exit", None) => Some(ConsoleCommand::Quit),
        ("help", None) => Some(ConsoleCommand::Help),
        _ => None,
    }
}

pub async fn process_track_command(command: TrackCommand, app_dir: PathBuf) -> Result<()> {
    let config = TrackerConfig {
        activity_interval: Duration::from_secs(command.activity_interval.max(1)),
        flush_interval: Duration::from_secs(command.flush_interval.max(1)),
        ..TrackerConfig::in_dir(app_dir)
    };
    let probe = GenericProbe::new()?;
    let (sender, receiver) = mpsc::channel::<Intent>(16);

    println!("{HELP}");
    if let Some(task) = command.task {
        sender.send(Intent::Start(Some(task))).await?;
    }

    let (session_result, _) = tokio::join!(
        start_session(&config, receiver, Box::new(probe), DefaultClock),
        run_console(sender),
    );
    session_result
}

/// Feeds stdin commands into the session. Ends when the session goes away or stdin closes,
/// which drops the sender and closes the session.
async fn run_console(sender: mpsc::Sender<Intent>) {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    loop {
        let line = tokio::select! {
            _ = sender.closed() => return,
            line = lines.next() => line,
        };
        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!("Failed to read the console {e:?}");
                return;
            }
            None => return,
        };

        let Some(command) = parse_command(&line) else {
            println!("Unknown command {:?}. {HELP}", line.trim());
            continue;
        };
        debug!("Console command {:?}", command);
        let intent = match command {
            ConsoleCommand::Start(task) => Intent::Start(task),
            ConsoleCommand::Stop => Intent::Stop,
            ConsoleCommand::Switch(task) => Intent::Switch(task),
            ConsoleCommand::Quit => Intent::Close,
            ConsoleCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ConsoleCommand::Status => {
                print_status(&sender).await;
                continue;
            }
        };
        let quit = matches!(intent, Intent::Close);
        if sender.send(intent).await.is_err() || quit {
            return;
        }
        print_status(&sender).await;
    }
}

async fn print_status(sender: &mpsc::Sender<Intent>) {
    let (reply, snapshot) = oneshot::channel();
    if sender.send(Intent::Status(reply)).await.is_err() {
        return;
    }
    if let Ok(snapshot) = snapshot.await {
        println!("{}", format_snapshot(&snapshot));
    }
}

fn format_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = format!(
        "{}\tworked {}\tactive {} (avg {}, now {})",
        snapshot.task_label(),
        format_clock(snapshot.worked_today),
        format_clock(snapshot.active_today),
        snapshot.average_activity(),
        snapshot.current_activity(),
    );
    let mut tasks = snapshot.time_by_task.iter().collect::<Vec<_>>();
    tasks.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (task, duration) in tasks {
        let task = if task.is_empty() { "(no task)" } else { task };
        out.push_str(&format!("\n  {}\t{}", format_clock(*duration), task));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Duration;

    use crate::session::state::SessionSnapshot;

    use super::{format_snapshot, parse_command, ConsoleCommand};

    #[test]
    fn parses_console_commands() {
        assert_eq!(parse_command("start"), Some(ConsoleCommand::Start(None)));
        assert_eq!(
            parse_command("  start  Code review "),
            Some(ConsoleCommand::Start(Some("Code review".into())))
        );
        assert_eq!(parse_command("stop"), Some(ConsoleCommand::Stop));
        assert_eq!(
            parse_command("switch Docs"),
            Some(ConsoleCommand::Switch("Docs".into()))
        );
        assert_eq!(parse_command("switch"), None);
        assert_eq!(parse_command(""), Some(ConsoleCommand::Status));
        assert_eq!(parse_command("quit"), Some(ConsoleCommand::Quit));
        assert_eq!(parse_command("stop now"), None);
        assert_eq!(parse_command("dance"), None);
    }

    #[test]
    fn formats_snapshot() {
        let snapshot = SessionSnapshot {
            is_running: true,
            current_task: "Docs".into(),
            worked_today: Duration::seconds(3600),
            active_today: Duration::seconds(1800),
            time_by_task: HashMap::from([
                ("Docs".to_string(), Duration::seconds(600)),
                ("".to_string(), Duration::seconds(3000)),
            ]),
            last_tick_active: Duration::seconds(1),
            activity_interval: Duration::seconds(1),
        };
        assert_eq!(
            format_snapshot(&snapshot),
            "Docs\tworked 01:00:00\tactive 00:30:00 (avg 50%, now 100%)\n  00:50:00\t(no task)\n  00:10:00\tDocs"
        );
    }
}
