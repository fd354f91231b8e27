//! The live session: one guarded [`state::SessionState`] moved forward by user intents and two
//! timers, persisting its progress as chunks.

use std::{path::PathBuf, sync::Arc, time::Duration};

use activity::ActivityModule;
use anyhow::{Context, Result};
use flush::FlushModule;
use intent::{Intent, IntentModule};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracker::SessionTracker;
use tracing::{error, info};

use crate::{probe::ActivityProbe, storage::chunk_storage::ChunkStorageImpl, utils::clock::Clock};

pub mod activity;
pub mod flush;
pub mod intent;
pub mod shutdown;
pub mod state;
pub mod tasks;
pub mod tracker;

pub const DEFAULT_ACTIVITY_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub records_dir: PathBuf,
    pub tasks_file: PathBuf,
    pub activity_interval: Duration,
    pub flush_interval: Duration,
}

impl TrackerConfig {
    pub fn in_dir(app_dir: PathBuf) -> Self {
        Self {
            records_dir: app_dir.join("records"),
            tasks_file: app_dir.join("tasks.json"),
            activity_interval: DEFAULT_ACTIVITY_INTERVAL,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

/// Runs a session until it is closed, either by a `Close` intent, the intent channel closing, or
/// an interrupt.
pub async fn start_session(
    config: &TrackerConfig,
    intents: mpsc::Receiver<Intent>,
    probe: Box<dyn ActivityProbe>,
    clock: impl Clock + Clone,
) -> Result<()> {
    let storage = ChunkStorageImpl::new(config.records_dir.clone())
        .with_context(|| format!("Failed to open {}", config.records_dir.display()))?;
    let activity_interval = chrono::Duration::from_std(config.activity_interval)?;

    let tracker = Arc::new(
        SessionTracker::initialize(
            storage,
            probe,
            Box::new(clock.clone()),
            activity_interval,
            CancellationToken::new(),
        )
        .await?,
    );

    let activity = ActivityModule::new(
        tracker.clone(),
        config.activity_interval,
        Box::new(clock.clone()),
    );
    let flush = FlushModule::new(tracker.clone(), config.flush_interval, Box::new(clock));
    let intents = IntentModule::new(intents, tracker.clone());

    info!("Session ready");
    let (_, activity_result, flush_result, intent_result) = tokio::join!(
        shutdown::detect_shutdown(tracker.clone()),
        activity.run(),
        flush.run(),
        intents.run(),
    );

    if let Err(e) = &activity_result {
        error!("Activity module got an error {:?}", e);
    }
    if let Err(e) = &intent_result {
        error!("Intent module got an error {:?}", e);
    }
    activity_result?;
    intent_result?;
    flush_result
}
