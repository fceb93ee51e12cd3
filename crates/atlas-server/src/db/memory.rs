//! In-memory adapter for the country store.
//!
//! Backs the test suites and mirrors the Postgres adapter's observable
//! behavior, including nulls-last ordering for GDP sorts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Country, CountryFilter, CountrySnapshot, CountryStore, SortKey, StoreError, SyncStatusRecord,
};

#[derive(Default)]
struct Inner {
    countries: HashMap<String, Country>,
    status: Option<SyncStatusRecord>,
}

/// Thread-safe in-memory country store.
#[derive(Default, Clone)]
pub struct InMemoryCountryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryCountryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CountryStore for InMemoryCountryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.countries.get(name).cloned())
    }

    async fn insert(
        &self,
        snapshot: CountrySnapshot,
        refreshed_at: DateTime<Utc>,
    ) -> Result<Country, StoreError> {
        let country = Country {
            id: Uuid::new_v4(),
            name: snapshot.name.clone(),
            capital: snapshot.capital,
            region: snapshot.region,
            population: snapshot.population,
            currency_code: snapshot.currency_code,
            exchange_rate: snapshot.exchange_rate,
            estimated_gdp: snapshot.estimated_gdp,
            flag_url: snapshot.flag_url,
            last_refreshed_at: refreshed_at,
        };

        let mut inner = self.inner.write().await;
        inner.countries.insert(country.name.clone(), country.clone());
        Ok(country)
    }

    async fn update(
        &self,
        id: Uuid,
        snapshot: CountrySnapshot,
        refreshed_at: DateTime<Utc>,
    ) -> Result<Country, StoreError> {
        let country = Country {
            id,
            name: snapshot.name.clone(),
            capital: snapshot.capital,
            region: snapshot.region,
            population: snapshot.population,
            currency_code: snapshot.currency_code,
            exchange_rate: snapshot.exchange_rate,
            estimated_gdp: snapshot.estimated_gdp,
            flag_url: snapshot.flag_url,
            last_refreshed_at: refreshed_at,
        };

        let mut inner = self.inner.write().await;
        inner.countries.insert(country.name.clone(), country.clone());
        Ok(country)
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.countries.remove(name).is_some())
    }

    async fn list(&self, filter: &CountryFilter) -> Result<Vec<Country>, StoreError> {
        let inner = self.inner.read().await;

        let mut countries: Vec<Country> = inner
            .countries
            .values()
            .filter(|c| match filter.region {
                Some(ref region) => c.region.as_deref() == Some(region.as_str()),
                None => true,
            })
            .filter(|c| match filter.currency {
                Some(ref currency) => c.currency_code.as_deref() == Some(currency.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        match filter.sort {
            SortKey::NameAsc => countries.sort_by(|a, b| a.name.cmp(&b.name)),
            SortKey::NameDesc => countries.sort_by(|a, b| b.name.cmp(&a.name)),
            SortKey::GdpAsc => {
                countries.sort_by(|a, b| cmp_gdp_nulls_last(a.estimated_gdp, b.estimated_gdp, false))
            },
            SortKey::GdpDesc => {
                countries.sort_by(|a, b| cmp_gdp_nulls_last(a.estimated_gdp, b.estimated_gdp, true))
            },
            SortKey::PopulationAsc => countries.sort_by_key(|c| c.population),
            SortKey::PopulationDesc => countries.sort_by_key(|c| std::cmp::Reverse(c.population)),
        }

        Ok(countries)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.countries.len() as i64)
    }

    async fn top_by_gdp(&self, limit: i64) -> Result<Vec<Country>, StoreError> {
        let filter = CountryFilter {
            sort: SortKey::GdpDesc,
            ..Default::default()
        };
        let mut countries = self.list(&filter).await?;
        countries.retain(|c| c.estimated_gdp.is_some());
        countries.truncate(limit.max(0) as usize);
        Ok(countries)
    }

    async fn status(&self) -> Result<Option<SyncStatusRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.status)
    }

    async fn upsert_status(
        &self,
        total_countries: i64,
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.status = Some(SyncStatusRecord {
            total_countries,
            last_refreshed_at: refreshed_at,
        });
        Ok(())
    }

    async fn update_status_total(&self, total_countries: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(ref mut status) = inner.status {
            status.total_countries = total_countries;
        }
        Ok(())
    }
}

/// Comparator with missing values ordered after present ones in both
/// directions, matching `NULLS LAST` in the Postgres adapter.
fn cmp_gdp_nulls_last(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
