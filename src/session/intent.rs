use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::storage::chunk_storage::ChunkStorage;

use super::{state::SessionSnapshot, tracker::SessionTracker};

/// Something the user asked the session to do.
#[derive(Debug)]
pub enum Intent {
    Start(Option<String>),
    Stop,
    Switch(String),
    Status(oneshot::Sender<SessionSnapshot>),
    Close,
}

/// Applies user intents to the tracker in the order they arrive. The session is closed when the
/// sending side goes away.
pub struct IntentModule<S> {
    receiver: mpsc::Receiver<Intent>,
    tracker: Arc<SessionTracker<S>>,
}

impl<S: ChunkStorage> IntentModule<S> {
    pub fn new(receiver: mpsc::Receiver<Intent>, tracker: Arc<SessionTracker<S>>) -> Self {
        Self { receiver, tracker }
    }

    pub async fn run(mut self) -> Result<()> {
        let shutdown = self.tracker.shutdown_token().clone();
        loop {
            let intent = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                intent = self.receiver.recv() => intent,
            };

            let Some(intent) = intent else {
                info!("Intent channel closed");
                return self.tracker.close().await;
            };

            debug!("Handling intent {:?}", intent);
            if let Err(e) = self.apply(intent).await {
                error!("Failed to apply intent, shutting down {e:?}");
                shutdown.cancel();
                return Err(e);
            }
        }
    }

    async fn apply(&self, intent: Intent) -> Result<()> {
        match intent {
            Intent::Start(task) => self.tracker.start(task).await,
            Intent::Stop => self.tracker.stop().await,
            Intent::Switch(task) => self.tracker.switch_task(task).await,
            Intent::Status(reply) => {
                // The asker may have given up waiting.
                let _ = reply.send(self.tracker.snapshot().await);
                Ok(())
            }
            Intent::Close => self.tracker.close().await,
        }
    }
}
