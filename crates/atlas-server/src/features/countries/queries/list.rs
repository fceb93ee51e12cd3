use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{Country, CountryFilter, CountryStore, SortKey, StoreError};
use crate::error::AppError;

/// Raw query parameters of `GET /countries`. The sort value is validated
/// here, before the request reaches the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCountriesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListCountriesError {
    #[error("{0}")]
    InvalidSort(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ListCountriesError> for AppError {
    fn from(err: ListCountriesError) -> Self {
        match err {
            ListCountriesError::InvalidSort(message) => AppError::Validation {
                field: "sort".to_string(),
                message,
            },
            ListCountriesError::Store(e) => e.into(),
        }
    }
}

impl ListCountriesQuery {
    pub fn validate(&self) -> Result<CountryFilter, ListCountriesError> {
        let sort = match self.sort.as_deref() {
            Some(value) => value
                .parse::<SortKey>()
                .map_err(ListCountriesError::InvalidSort)?,
            None => SortKey::default(),
        };

        Ok(CountryFilter {
            region: self.region.clone(),
            currency: self.currency.clone(),
            sort,
        })
    }
}

/// Filtered, sorted projection of the reconciled set. Always returns; an
/// empty vector when nothing matches.
#[tracing::instrument(skip(store, query), fields(region = ?query.region, currency = ?query.currency, sort = ?query.sort))]
pub async fn handle(
    store: Arc<dyn CountryStore>,
    query: ListCountriesQuery,
) -> Result<Vec<Country>, ListCountriesError> {
    let filter = query.validate()?;
    let countries = store.list(&filter).await?;
    Ok(countries)
}
