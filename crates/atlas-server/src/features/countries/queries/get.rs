use std::sync::Arc;

use crate::db::{Country, CountryStore, StoreError};
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum GetCountryError {
    #[error("Country not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GetCountryError> for AppError {
    fn from(err: GetCountryError) -> Self {
        match err {
            GetCountryError::NotFound(_) => AppError::NotFound("Country not found".to_string()),
            GetCountryError::Store(e) => e.into(),
        }
    }
}

/// Exact-name lookup.
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: Arc<dyn CountryStore>,
    name: String,
) -> Result<Country, GetCountryError> {
    store
        .find_by_name(&name)
        .await?
        .ok_or(GetCountryError::NotFound(name))
}
