use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::{error, info};

use crate::{storage::chunk_storage::ChunkStorage, utils::clock::Clock};

use super::tracker::SessionTracker;

/// Periodically persists the running chunk. A failed write ends the session: tracked time is
/// never silently dropped.
pub struct FlushModule<S> {
    tracker: Arc<SessionTracker<S>>,
    interval: Duration,
    clock: Box<dyn Clock>,
}

impl<S: ChunkStorage> FlushModule<S> {
    pub fn new(tracker: Arc<SessionTracker<S>>, interval: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            tracker,
            interval,
            clock,
        }
    }

    pub async fn run(self) -> Result<()> {
        let shutdown = self.tracker.shutdown_token().clone();
        let mut flush_point = self.clock.instant();
        loop {
            flush_point += self.interval;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Flushing stopped");
                    return Ok(())
                }
                _ = self.clock.sleep_until(flush_point) => ()
            }

            if let Err(e) = self.tracker.flush_tick().await {
                error!("Flush failed, shutting down {e:?}");
                shutdown.cancel();
                return Err(e);
            }
        }
    }
}
