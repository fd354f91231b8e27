use anyhow::{Context, Result};
use chrono::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    probe::ActivityProbe,
    storage::{chunk_storage::ChunkStorage, entities::Chunk},
    utils::{
        clock::Clock,
        time::{local_date, to_local},
    },
};

use super::state::{PendingChunk, SessionSnapshot, SessionState};

/// Owns the session state and everything needed to move it forward: the clock, the activity
/// probe, and the chunk log.
///
/// The state lock is only held for in-memory work. Chunks are cut under the state lock and
/// written after it is released, while `write_order` keeps them in the file in the order they
/// were cut.
pub struct SessionTracker<S> {
    state: Mutex<SessionState>,
    write_order: Mutex<()>,
    probe: Mutex<Box<dyn ActivityProbe>>,
    storage: S,
    clock: Box<dyn Clock>,
    activity_interval: Duration,
    shutdown: CancellationToken,
}

impl<S: ChunkStorage> SessionTracker<S> {
    /// Seeds a stopped session from today's file. Any problem with that file is fatal, a session
    /// must not start from totals it can't trust.
    pub async fn initialize(
        storage: S,
        probe: Box<dyn ActivityProbe>,
        clock: Box<dyn Clock>,
        activity_interval: Duration,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let now = clock.time();
        let today = local_date(now);
        let totals = storage
            .load_day_totals(today)
            .await
            .with_context(|| format!("Failed to load totals for {today}"))?;
        info!(
            "Loaded today's totals: worked {}, active {}",
            totals.worked, totals.active
        );

        Ok(Self {
            state: Mutex::new(SessionState::new(totals, now)),
            write_order: Mutex::new(()),
            probe: Mutex::new(probe),
            storage,
            clock,
            activity_interval,
            shutdown,
        })
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot(self.activity_interval)
    }

    /// Starts tracking. `None` tracks without a task.
    #[instrument(skip(self))]
    pub async fn start(&self, task: Option<String>) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        let now = self.clock.time();
        if self
            .state
            .lock()
            .await
            .start(task.unwrap_or_default(), now)
        {
            info!("Started tracking");
        } else {
            debug!("Already tracking, ignoring start");
        }
        Ok(())
    }

    /// Moves tracking to another task. Starts tracking if the session was stopped.
    #[instrument(skip(self))]
    pub async fn switch_task(&self, task: String) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        self.activity_tick().await;

        let _write = self.write_order.lock().await;
        let pending = {
            let mut state = self.state.lock().await;
            let now = self.clock.time();
            if state.is_running() {
                state.switch_task(task, now)
            } else {
                state.start(task, now);
                None
            }
        };
        self.write(pending).await
    }

    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        self.activity_tick().await;

        let _write = self.write_order.lock().await;
        let pending = {
            let mut state = self.state.lock().await;
            if !state.is_running() {
                debug!("Not tracking, ignoring stop");
                return Ok(());
            }
            state.stop(self.clock.time())
        };
        info!("Stopped tracking");
        self.write(pending).await
    }

    /// Writes the last chunk and fires the shutdown signal. Only the first call does anything.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        self.activity_tick().await;

        let _write = self.write_order.lock().await;
        if self.shutdown.is_cancelled() {
            return Ok(());
        }
        let pending = self.state.lock().await.stop(self.clock.time());
        let result = self.write(pending).await;
        self.shutdown.cancel();
        info!("Session closed");
        result
    }

    /// Samples the probe and folds the sample into the totals.
    pub async fn activity_tick(&self) {
        let idle = self.probe.lock().await.idle_since().await;
        let now = self.clock.time();
        self.state.lock().await.record_tick(idle, now);
    }

    /// Persists everything tracked since the last chunk boundary.
    pub async fn flush_tick(&self) -> Result<()> {
        let _write = self.write_order.lock().await;
        let pending = self.state.lock().await.flush(self.clock.time());
        self.write(pending).await
    }

    async fn write(&self, pending: Option<PendingChunk>) -> Result<()> {
        let Some(pending) = pending else {
            return Ok(());
        };
        let chunk = Chunk::new(
            pending.task_name,
            to_local(pending.start),
            to_local(pending.end),
            pending.active,
        )
        .inspect_err(|e| warn!("Refusing to write chunk: {e}"))?;
        self.storage
            .append(&chunk)
            .await
            .context("Failed to append chunk")?;
        debug!(
            "Flushed {} of {:?}, active {}",
            chunk.duration(),
            chunk.task_name,
            chunk.active_time
        );
        Ok(())
    }
}
