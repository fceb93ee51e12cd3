//! End-to-end pipeline behavior against the in-memory store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use atlas_server::db::{CountryStore, InMemoryCountryStore};
use atlas_server::error::AppError;
use atlas_server::sync::{
    CatalogueCountry, CatalogueCurrency, CatalogueSource, FixedMultiplier, RateSource,
    SourceError, SyncError, SyncService, UniformMultiplier,
};

struct StubCatalogue(Vec<CatalogueCountry>);

#[async_trait]
impl CatalogueSource for StubCatalogue {
    async fn fetch_countries(&self) -> Result<Vec<CatalogueCountry>, SourceError> {
        Ok(self.0.clone())
    }
}

struct StubRates(HashMap<String, f64>);

#[async_trait]
impl RateSource for StubRates {
    async fn fetch_rates(&self) -> Result<HashMap<String, f64>, SourceError> {
        Ok(self.0.clone())
    }
}

struct FailingRates;

#[async_trait]
impl RateSource for FailingRates {
    async fn fetch_rates(&self) -> Result<HashMap<String, f64>, SourceError> {
        Err(SourceError::Unavailable {
            feed: "Exchange Rate API",
            detail: "feed reported result 'error'".to_string(),
        })
    }
}

fn entry(name: &str, population: i64, codes: &[&str]) -> CatalogueCountry {
    CatalogueCountry {
        name: name.to_string(),
        capital: None,
        region: None,
        population,
        flag: None,
        currencies: codes
            .iter()
            .map(|code| CatalogueCurrency {
                code: Some(code.to_string()),
                name: None,
                symbol: None,
            })
            .collect(),
    }
}

fn pipeline(
    store: Arc<InMemoryCountryStore>,
    countries: Vec<CatalogueCountry>,
    rates: HashMap<String, f64>,
) -> SyncService {
    SyncService::new(
        store,
        Arc::new(StubCatalogue(countries)),
        Arc::new(StubRates(rates)),
    )
    .with_multiplier(Arc::new(FixedMultiplier(1500.0)))
}

#[tokio::test]
async fn country_without_currency_gets_zero_gdp() {
    let store = Arc::new(InMemoryCountryStore::new());
    let sync = pipeline(
        store.clone(),
        vec![entry("Wakanda", 1000, &[])],
        HashMap::new(),
    );

    sync.run().await.unwrap();

    let country = store.find_by_name("Wakanda").await.unwrap().unwrap();
    assert_eq!(country.estimated_gdp, Some(0.0));
    assert!(country.exchange_rate.is_none());
    assert!(country.currency_code.is_none());
}

#[tokio::test]
async fn country_with_unmapped_currency_gets_null_gdp() {
    let store = Arc::new(InMemoryCountryStore::new());
    let rates = HashMap::from([("USD".to_string(), 1.0)]);
    let sync = pipeline(store.clone(), vec![entry("Narnia", 500, &["NAR"])], rates);

    sync.run().await.unwrap();

    let country = store.find_by_name("Narnia").await.unwrap().unwrap();
    assert_eq!(country.currency_code.as_deref(), Some("NAR"));
    assert!(country.exchange_rate.is_none());
    assert!(country.estimated_gdp.is_none());
}

#[tokio::test]
async fn mapped_currency_yields_exact_derived_gdp() {
    let store = Arc::new(InMemoryCountryStore::new());
    let rates = HashMap::from([("USD".to_string(), 2.0)]);
    let sync = pipeline(store.clone(), vec![entry("X", 2000, &["USD"])], rates);

    sync.run().await.unwrap();

    let country = store.find_by_name("X").await.unwrap().unwrap();
    assert_eq!(country.currency_code.as_deref(), Some("USD"));
    assert_eq!(country.exchange_rate, Some(2.0));
    assert_eq!(country.estimated_gdp, Some(2000.0 * 1500.0 / 2.0));
}

#[tokio::test]
async fn uniform_multiplier_stays_in_documented_range() {
    let store = Arc::new(InMemoryCountryStore::new());
    let rates = HashMap::from([("USD".to_string(), 2.0)]);
    let sync = SyncService::new(
        store.clone(),
        Arc::new(StubCatalogue(vec![entry("X", 2000, &["USD"])])),
        Arc::new(StubRates(rates)),
    )
    .with_multiplier(Arc::new(UniformMultiplier));

    sync.run().await.unwrap();

    let country = store.find_by_name("X").await.unwrap().unwrap();
    let gdp = country.estimated_gdp.unwrap();
    assert!(gdp.is_finite() && gdp > 0.0);

    // Recover the multiplier: gdp = population * m / rate.
    let multiplier = gdp * 2.0 / 2000.0;
    assert!((1000.0..2000.0).contains(&multiplier));
}

#[tokio::test]
async fn second_run_updates_everything_and_inserts_nothing() {
    let store = Arc::new(InMemoryCountryStore::new());
    let catalogue = vec![
        entry("Chad", 16_425_864, &["XAF"]),
        entry("Mali", 20_250_833, &["XOF"]),
        entry("Wakanda", 1000, &[]),
    ];
    let rates = HashMap::from([("XAF".to_string(), 600.0), ("XOF".to_string(), 600.0)]);
    let sync = pipeline(store.clone(), catalogue.clone(), rates);

    let first = sync.run().await.unwrap();
    assert_eq!(first.inserted, 3);
    assert_eq!(first.updated, 0);

    let second = sync.run().await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, catalogue.len() as u64);

    // Aggregate stays consistent with the row count.
    let status = store.status().await.unwrap().unwrap();
    assert_eq!(status.total_countries, store.count().await.unwrap());
    assert_eq!(status.total_countries, 3);
}

#[tokio::test]
async fn failing_rate_feed_aborts_without_touching_storage() {
    let store = Arc::new(InMemoryCountryStore::new());

    // Seed one record through a successful run.
    let seed = pipeline(
        store.clone(),
        vec![entry("Chad", 16_425_864, &[])],
        HashMap::new(),
    );
    seed.run().await.unwrap();
    let rows_before = store.count().await.unwrap();
    let status_before = store.status().await.unwrap().unwrap();

    let sync = SyncService::new(
        store.clone(),
        Arc::new(StubCatalogue(vec![
            entry("Chad", 1, &[]),
            entry("Mali", 2, &[]),
        ])),
        Arc::new(FailingRates),
    );

    let err = sync.run().await.unwrap_err();
    assert!(matches!(err, SyncError::Upstream(_)));

    // Surfaces as the 503 taxonomy entry.
    let app_err: AppError = err.into();
    assert!(matches!(app_err, AppError::UpstreamUnavailable { .. }));

    // No partial writes: same rows, same aggregate, same timestamp.
    assert_eq!(store.count().await.unwrap(), rows_before);
    let status_after = store.status().await.unwrap().unwrap();
    assert_eq!(status_after.total_countries, status_before.total_countries);
    assert_eq!(
        status_after.last_refreshed_at,
        status_before.last_refreshed_at
    );

    let chad = store.find_by_name("Chad").await.unwrap().unwrap();
    assert_eq!(chad.population, 16_425_864);
}

#[tokio::test]
async fn refresh_overwrites_previous_snapshot() {
    let store = Arc::new(InMemoryCountryStore::new());
    let rates = HashMap::from([("XAF".to_string(), 600.0)]);

    let first = pipeline(
        store.clone(),
        vec![entry("Chad", 16_000_000, &["XAF"])],
        rates.clone(),
    );
    first.run().await.unwrap();
    let original = store.find_by_name("Chad").await.unwrap().unwrap();

    // The feed now reports a larger population and no currency.
    let second = pipeline(store.clone(), vec![entry("Chad", 17_000_000, &[])], rates);
    second.run().await.unwrap();

    let refreshed = store.find_by_name("Chad").await.unwrap().unwrap();
    assert_eq!(refreshed.id, original.id);
    assert_eq!(refreshed.population, 17_000_000);
    assert!(refreshed.currency_code.is_none());
    assert_eq!(refreshed.estimated_gdp, Some(0.0));
    assert!(refreshed.last_refreshed_at >= original.last_refreshed_at);
}

#[tokio::test]
async fn all_records_in_a_run_share_the_run_timestamp() {
    let store = Arc::new(InMemoryCountryStore::new());
    let catalogue: Vec<_> = (0..120)
        .map(|i| entry(&format!("Country {i}"), i, &[]))
        .collect();
    let sync = pipeline(store.clone(), catalogue, HashMap::new()).with_batch_size(50);

    sync.run().await.unwrap();

    let first = store.find_by_name("Country 0").await.unwrap().unwrap();
    let last = store.find_by_name("Country 119").await.unwrap().unwrap();
    assert_eq!(first.last_refreshed_at, last.last_refreshed_at);

    let status = store.status().await.unwrap().unwrap();
    assert_eq!(status.last_refreshed_at, first.last_refreshed_at);
    assert_eq!(status.total_countries, 120);
}
