use std::sync::Arc;

use tokio::select;
use tracing::{error, info};

use crate::storage::chunk_storage::ChunkStorage;

use super::tracker::SessionTracker;

/// Closes the session on Ctrl-C. Returns early when something else closed it first.
///
/// On Windows detached processes can't detect signals sent to them, there `quit` on the console
/// is the only way out.
pub async fn detect_shutdown<S: ChunkStorage>(tracker: Arc<SessionTracker<S>>) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt");
            if let Err(e) = tracker.close().await {
                error!("Failed to close session {e:?}");
            }
        },
        _ = tracker.shutdown_token().cancelled() => (),
    };
}
