use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{CountryStore, StoreError};

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub total_countries: i64,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Current aggregate status. When no refresh has ever completed, a
/// zero-count/current-time default is synthesized rather than stored.
#[tracing::instrument(skip(store))]
pub async fn handle(store: Arc<dyn CountryStore>) -> Result<StatusResponse, StoreError> {
    let status = store.status().await?;

    Ok(match status {
        Some(record) => StatusResponse {
            total_countries: record.total_countries,
            last_refreshed_at: record.last_refreshed_at,
        },
        None => StatusResponse {
            total_countries: 0,
            last_refreshed_at: Utc::now(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryCountryStore;

    #[tokio::test]
    async fn test_synthesized_default_before_first_refresh() {
        let store = Arc::new(InMemoryCountryStore::new());

        let response = handle(store.clone()).await.unwrap();
        assert_eq!(response.total_countries, 0);

        // Nothing was written while synthesizing the default.
        assert!(store.status().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reports_stored_status() {
        let store = Arc::new(InMemoryCountryStore::new());
        let refreshed_at = Utc::now();
        store.upsert_status(42, refreshed_at).await.unwrap();

        let response = handle(store).await.unwrap();
        assert_eq!(response.total_countries, 42);
        assert_eq!(response.last_refreshed_at, refreshed_at);
    }
}
