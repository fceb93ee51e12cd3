use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{CountryStore, StoreError};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCountryCommand {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteCountryError {
    #[error("Country name is required and cannot be empty")]
    NameRequired,
    #[error("Country not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DeleteCountryError> for AppError {
    fn from(err: DeleteCountryError) -> Self {
        match err {
            DeleteCountryError::NameRequired => AppError::Validation {
                field: "name".to_string(),
                message: "must not be empty".to_string(),
            },
            DeleteCountryError::NotFound(_) => AppError::NotFound("Country not found".to_string()),
            DeleteCountryError::Store(e) => e.into(),
        }
    }
}

impl DeleteCountryCommand {
    pub fn validate(&self) -> Result<(), DeleteCountryError> {
        if self.name.is_empty() {
            return Err(DeleteCountryError::NameRequired);
        }
        Ok(())
    }
}

/// Remove a country by exact name and recount the aggregate status. The
/// status timestamp is left untouched.
#[tracing::instrument(skip(store), fields(name = %command.name))]
pub async fn handle(
    store: Arc<dyn CountryStore>,
    command: DeleteCountryCommand,
) -> Result<(), DeleteCountryError> {
    command.validate()?;

    let removed = store.delete_by_name(&command.name).await?;
    if !removed {
        return Err(DeleteCountryError::NotFound(command.name));
    }

    let total = store.count().await?;
    store.update_status_total(total).await?;

    tracing::info!(total, "Country deleted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CountrySnapshot, InMemoryCountryStore};
    use chrono::Utc;

    fn snapshot(name: &str) -> CountrySnapshot {
        CountrySnapshot {
            name: name.to_string(),
            capital: None,
            region: None,
            population: 0,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: None,
            flag_url: None,
        }
    }

    #[test]
    fn test_validation_empty_name() {
        let cmd = DeleteCountryCommand {
            name: "".to_string(),
        };
        assert!(matches!(
            cmd.validate(),
            Err(DeleteCountryError::NameRequired)
        ));
    }

    #[tokio::test]
    async fn test_delete_recounts_status() {
        let store = Arc::new(InMemoryCountryStore::new());
        let now = Utc::now();
        store.insert(snapshot("Chad"), now).await.unwrap();
        store.insert(snapshot("Mali"), now).await.unwrap();
        store.upsert_status(2, now).await.unwrap();

        handle(
            store.clone(),
            DeleteCountryCommand {
                name: "Chad".to_string(),
            },
        )
        .await
        .unwrap();

        let status = store.status().await.unwrap().unwrap();
        assert_eq!(status.total_countries, 1);
        // The refresh timestamp is not a deletion timestamp.
        assert_eq!(status.last_refreshed_at, now);
    }

    #[tokio::test]
    async fn test_delete_missing_country_is_not_found() {
        let store = Arc::new(InMemoryCountryStore::new());
        let result = handle(
            store,
            DeleteCountryCommand {
                name: "Atlantis".to_string(),
            },
        )
        .await;

        assert!(matches!(result, Err(DeleteCountryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_second_delete_fails_with_not_found() {
        let store = Arc::new(InMemoryCountryStore::new());
        let now = Utc::now();
        store.insert(snapshot("Chad"), now).await.unwrap();
        store.upsert_status(1, now).await.unwrap();

        let command = DeleteCountryCommand {
            name: "Chad".to_string(),
        };
        handle(store.clone(), command.clone()).await.unwrap();
        let result = handle(store, command).await;

        assert!(matches!(result, Err(DeleteCountryError::NotFound(_))));
    }
}
