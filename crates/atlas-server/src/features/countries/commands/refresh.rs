use serde::Serialize;
use std::sync::Arc;

use crate::sync::{SyncError, SyncService};

#[derive(Debug, Clone, Serialize)]
pub struct RefreshCountriesResponse {
    pub message: String,
    pub inserted: u64,
    pub updated: u64,
    pub total: u64,
}

/// Run one reconciliation pass and report its counts.
#[tracing::instrument(skip(sync))]
pub async fn handle(sync: Arc<SyncService>) -> Result<RefreshCountriesResponse, SyncError> {
    let outcome = sync.run().await?;

    Ok(RefreshCountriesResponse {
        message: "Countries refreshed successfully".to_string(),
        inserted: outcome.inserted,
        updated: outcome.updated,
        total: outcome.inserted + outcome.updated,
    })
}
