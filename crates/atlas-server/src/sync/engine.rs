//! Reconciliation engine
//!
//! One run: fetch both feeds concurrently, derive a snapshot per catalogue
//! entry, upsert by exact country name in fixed-size batches, recount the
//! aggregate status, then kick off summary-artifact regeneration without
//! waiting for it.
//!
//! Runs are serialized by an internal mutex: the read-then-write existence
//! check is not transactional, so two interleaved runs could otherwise race
//! on the business key. Readers are not serialized against a run.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::artifact::SummaryPublisher;
use crate::db::{CountrySnapshot, CountryStore, StoreError};
use crate::error::AppError;

use super::multiplier::{GdpMultiplier, UniformMultiplier};
use super::sources::{CatalogueCountry, CatalogueSource, RateSource, SourceError};

/// Default number of catalogue entries written per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default bound on detached artifact regeneration.
pub const DEFAULT_ARTIFACT_TIMEOUT: Duration = Duration::from_secs(30);

/// Counts reported by one reconciliation run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncOutcome {
    pub inserted: u64,
    pub updated: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Upstream(#[from] SourceError),
    #[error("Storage error during refresh: {0}")]
    Store(#[from] StoreError),
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Upstream(e) => AppError::UpstreamUnavailable {
                detail: e.to_string(),
            },
            SyncError::Store(e) => e.into(),
        }
    }
}

/// The reconciliation pipeline, constructed once at startup.
pub struct SyncService {
    store: Arc<dyn CountryStore>,
    catalogue: Arc<dyn CatalogueSource>,
    rates: Arc<dyn RateSource>,
    multiplier: Arc<dyn GdpMultiplier>,
    publisher: Option<Arc<SummaryPublisher>>,
    batch_size: usize,
    artifact_timeout: Duration,
    run_lock: Mutex<()>,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn CountryStore>,
        catalogue: Arc<dyn CatalogueSource>,
        rates: Arc<dyn RateSource>,
    ) -> Self {
        Self {
            store,
            catalogue,
            rates,
            multiplier: Arc::new(UniformMultiplier),
            publisher: None,
            batch_size: DEFAULT_BATCH_SIZE,
            artifact_timeout: DEFAULT_ARTIFACT_TIMEOUT,
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_multiplier(mut self, multiplier: Arc<dyn GdpMultiplier>) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<SummaryPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_artifact_timeout(mut self, timeout: Duration) -> Self {
        self.artifact_timeout = timeout;
        self
    }

    /// Execute one reconciliation run.
    ///
    /// Fails as a unit if either feed fails; in that case no records have
    /// been touched.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<SyncOutcome, SyncError> {
        let _guard = self.run_lock.lock().await;
        let started_at = Utc::now();

        let (countries, rates) = tokio::try_join!(
            async {
                self.catalogue
                    .fetch_countries()
                    .await
                    .map_err(SyncError::from)
            },
            async { self.rates.fetch_rates().await.map_err(SyncError::from) },
        )?;

        let mut inserted = 0u64;
        let mut updated = 0u64;

        for (batch_index, batch) in countries.chunks(self.batch_size).enumerate() {
            for entry in batch {
                let snapshot = self.reconcile(entry, &rates);

                match self.store.find_by_name(&snapshot.name).await? {
                    Some(existing) => {
                        self.store.update(existing.id, snapshot, started_at).await?;
                        updated += 1;
                    },
                    None => {
                        self.store.insert(snapshot, started_at).await?;
                        inserted += 1;
                    },
                }
            }

            debug!(
                batch = batch_index,
                size = batch.len(),
                "Processed catalogue batch"
            );
        }

        let total = self.store.count().await?;
        self.store.upsert_status(total, started_at).await?;

        info!(inserted, updated, total, "Refresh complete");

        self.spawn_artifact_refresh();

        Ok(SyncOutcome { inserted, updated })
    }

    /// Join one catalogue entry with the rate map and derive the snapshot.
    fn reconcile(
        &self,
        entry: &CatalogueCountry,
        rates: &HashMap<String, f64>,
    ) -> CountrySnapshot {
        let currency_code = entry.currencies.first().and_then(|c| c.code.clone());

        // A zero rate is treated as missing.
        let exchange_rate = currency_code
            .as_deref()
            .and_then(|code| rates.get(code).copied())
            .filter(|rate| *rate != 0.0);

        let estimated_gdp = match (&currency_code, exchange_rate) {
            (None, _) => Some(0.0),
            (Some(_), None) => None,
            (Some(_), Some(rate)) => {
                Some(entry.population as f64 * self.multiplier.sample() / rate)
            },
        };

        CountrySnapshot {
            name: entry.name.clone(),
            capital: entry.capital.clone(),
            region: entry.region.clone(),
            population: entry.population,
            currency_code,
            exchange_rate,
            estimated_gdp,
            flag_url: entry.flag.clone(),
        }
    }

    /// Detach artifact regeneration from the caller. Failures and timeouts
    /// are logged, never propagated.
    fn spawn_artifact_refresh(&self) {
        let Some(publisher) = self.publisher.clone() else {
            return;
        };
        let timeout = self.artifact_timeout;

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, publisher.publish()).await {
                Ok(Ok(location)) => info!(%location, "Summary artifact regenerated"),
                Ok(Err(e)) => warn!(error = %e, "Summary artifact generation failed"),
                Err(_) => warn!("Summary artifact generation timed out"),
            }
        });
    }
}
