use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::{debug, info};

use crate::{storage::chunk_storage::ChunkStorage, utils::clock::Clock};

use super::tracker::SessionTracker;

/// Samples user activity on a fixed cadence until the session shuts down.
pub struct ActivityModule<S> {
    tracker: Arc<SessionTracker<S>>,
    interval: Duration,
    clock: Box<dyn Clock>,
}

impl<S: ChunkStorage> ActivityModule<S> {
    pub fn new(tracker: Arc<SessionTracker<S>>, interval: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            tracker,
            interval,
            clock,
        }
    }

    pub async fn run(self) -> Result<()> {
        let shutdown = self.tracker.shutdown_token().clone();
        let mut tick_point = self.clock.instant();
        loop {
            tick_point += self.interval;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Activity sampling stopped");
                    return Ok(())
                }
                _ = self.clock.sleep_until(tick_point) => ()
            }

            self.tracker.activity_tick().await;
            debug!("Activity tick");
        }
    }
}
