//! Background jobs.

use std::time::Duration;

use boardstack_core::invitation;
use boardstack_db::DbPool;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Periodically delete invitations older than `ttl`. The first sweep runs
/// immediately.
pub fn spawn_invitation_sweeper(db: DbPool, ttl: chrono::Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match invitation::purge_expired(&db, ttl).await {
                Ok(removed) => debug!(removed, "Invitation sweep finished"),
                Err(e) => warn!(error = %e, "Invitation sweep failed"),
            }
        }
    })
}
