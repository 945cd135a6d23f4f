//! Periodic removal of expired session rows.

use std::time::Duration;

use tracing::{error, info};

use super::SessionManager;

/// Runs one purge pass and returns the number of rows removed.
pub async fn run_sweep(sessions: &SessionManager) -> u64 {
    match sessions.purge_expired().await {
        Ok(count) => {
            if count > 0 {
                info!(purged = count, "purged expired sessions");
            }
            count
        }
        Err(err) => {
            error!(error = %err, "failed to purge expired sessions");
            0
        }
    }
}

pub fn spawn_session_sweeper(
    sessions: SessionManager,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            run_sweep(&sessions).await;
        }
    })
}
