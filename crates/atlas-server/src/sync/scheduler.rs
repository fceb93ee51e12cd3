//! Background refresh scheduler
//!
//! Re-runs the reconciliation pipeline on a fixed interval. Failures are
//! logged and the loop continues; the next cycle retries from scratch.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

use super::engine::SyncService;

/// Delay before the first scheduled run, so the server can finish starting.
const STARTUP_DELAY: Duration = Duration::from_secs(5);

pub struct RefreshScheduler {
    sync: Arc<SyncService>,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(sync: Arc<SyncService>, interval: Duration) -> Self {
        Self { sync, interval }
    }

    /// Start the scheduler in the background.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "Refresh scheduler started");

            sleep(STARTUP_DELAY).await;

            loop {
                match self.sync.run().await {
                    Ok(outcome) => {
                        info!(
                            inserted = outcome.inserted,
                            updated = outcome.updated,
                            "Scheduled refresh complete"
                        );
                    },
                    Err(e) => {
                        error!(error = %e, "Scheduled refresh failed");
                    },
                }

                sleep(self.interval).await;
            }
        })
    }
}
