//! Persistence port for country snapshots and the aggregate sync status.
//!
//! All core operations go through the [`CountryStore`] trait so the
//! reconciliation pipeline and the query layer never depend on a concrete
//! backend. [`postgres::PgCountryStore`] is the production adapter;
//! [`memory::InMemoryCountryStore`] backs the test suites.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use memory::InMemoryCountryStore;
pub use postgres::PgCountryStore;

/// A persisted country record. One row per country name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Country {
    pub id: Uuid,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

/// The fields a refresh writes. Identity (`id`) and the refresh timestamp
/// are supplied by the store call.
#[derive(Debug, Clone)]
pub struct CountrySnapshot {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
}

/// Singleton aggregate row: total row count and last completed refresh.
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct SyncStatusRecord {
    pub total_countries: i64,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Sort keys accepted by the list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    GdpAsc,
    GdpDesc,
    PopulationAsc,
    PopulationDesc,
}

impl SortKey {
    /// Accepted wire values, in the order they are documented.
    pub const ACCEPTED: [&'static str; 6] = [
        "name_asc",
        "name_desc",
        "gdp_asc",
        "gdp_desc",
        "population_asc",
        "population_desc",
    ];
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name_asc" => Ok(SortKey::NameAsc),
            "name_desc" => Ok(SortKey::NameDesc),
            "gdp_asc" => Ok(SortKey::GdpAsc),
            "gdp_desc" => Ok(SortKey::GdpDesc),
            "population_asc" => Ok(SortKey::PopulationAsc),
            "population_desc" => Ok(SortKey::PopulationDesc),
            other => Err(format!(
                "'{}' is not a valid sort key (expected one of: {})",
                other,
                SortKey::ACCEPTED.join(", ")
            )),
        }
    }
}

/// Filters applied by the list operation. Region and currency are exact
/// matches.
#[derive(Debug, Clone, Default)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: SortKey,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage port for the reconciliation pipeline and the query layer.
#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Exact, case-sensitive name lookup.
    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError>;

    async fn insert(
        &self,
        snapshot: CountrySnapshot,
        refreshed_at: DateTime<Utc>,
    ) -> Result<Country, StoreError>;

    /// Overwrites every derived field of an existing row.
    async fn update(
        &self,
        id: Uuid,
        snapshot: CountrySnapshot,
        refreshed_at: DateTime<Utc>,
    ) -> Result<Country, StoreError>;

    /// Returns true when a row was removed.
    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError>;

    async fn list(&self, filter: &CountryFilter) -> Result<Vec<Country>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Highest estimated GDP first; rows without a value are excluded.
    async fn top_by_gdp(&self, limit: i64) -> Result<Vec<Country>, StoreError>;

    async fn status(&self) -> Result<Option<SyncStatusRecord>, StoreError>;

    async fn upsert_status(
        &self,
        total_countries: i64,
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Recount after a deletion; the refresh timestamp is left untouched.
    async fn update_status_total(&self, total_countries: i64) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("name_asc".parse::<SortKey>().unwrap(), SortKey::NameAsc);
        assert_eq!("gdp_desc".parse::<SortKey>().unwrap(), SortKey::GdpDesc);
        assert_eq!(
            "population_asc".parse::<SortKey>().unwrap(),
            SortKey::PopulationAsc
        );
    }

    #[test]
    fn test_sort_key_rejects_unknown_values() {
        let err = "gdp".parse::<SortKey>().unwrap_err();
        assert!(err.contains("gdp_asc"));
        assert!("".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_default_sort_is_name_asc() {
        assert_eq!(CountryFilter::default().sort, SortKey::NameAsc);
    }
}
