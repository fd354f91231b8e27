pub mod report;
pub mod tasks;
pub mod track;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use report::{process_report_command, ReportCommand};
use tasks::process_tasks_command;
use track::{process_track_command, TrackCommand};
use tracing::level_filters::LevelFilter;

use crate::utils::{
    dir::create_application_default_path,
    logging::{enable_logging, REPORT_PREFIX, TRACKER_PREFIX},
};

#[derive(Parser, Debug)]
#[command(name = "worktracker", version, long_about = None)]
#[command(about = "Tracks how long and how actively you work", long_about = None)]
pub(crate) struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging to the console")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Track work in this console until `quit` or Ctrl-C")]
    Track {
        #[command(flatten)]
        command: TrackCommand,
    },
    #[command(about = "List tasks with the time spent on them today")]
    Tasks {},
    #[command(about = "Summarize tracked time over a range of days")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    let logging_level = args.log.then_some(LevelFilter::TRACE);
    let prefix = match args.commands {
        Commands::Report { .. } => REPORT_PREFIX,
        _ => TRACKER_PREFIX,
    };
    enable_logging(prefix, &app_dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        Commands::Track { command } => process_track_command(command, app_dir).await,
        Commands::Tasks {} => process_tasks_command(app_dir).await,
        Commands::Report { command } => process_report_command(command, app_dir).await,
    }
}
