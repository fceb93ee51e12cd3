//! External feed adapters
//!
//! Both feeds fail as a unit: an unreachable host, a timeout, a non-2xx
//! status, an unparseable body, or a rate payload whose `result` is not
//! `"success"` all surface as [`SourceError::Unavailable`] naming the feed.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// Feed name used in errors and logs for the country catalogue.
pub const CATALOGUE_FEED: &str = "Countries API";

/// Feed name used in errors and logs for the exchange-rate feed.
pub const RATES_FEED: &str = "Exchange Rate API";

/// One currency entry of a catalogue record.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogueCurrency {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// One country as reported by the catalogue feed.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogueCountry {
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: i64,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub currencies: Vec<CatalogueCurrency>,
}

/// Envelope of the exchange-rate feed.
#[derive(Debug, Deserialize)]
pub struct RatesEnvelope {
    pub result: String,
    #[serde(default)]
    pub base_code: Option<String>,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Could not fetch data from {feed}: {detail}")]
    Unavailable { feed: &'static str, detail: String },
}

impl SourceError {
    fn unavailable(feed: &'static str, detail: impl ToString) -> Self {
        Self::Unavailable {
            feed,
            detail: detail.to_string(),
        }
    }
}

/// Source of the full country catalogue.
#[async_trait]
pub trait CatalogueSource: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<CatalogueCountry>, SourceError>;
}

/// Source of the currency-code to exchange-rate map.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> Result<HashMap<String, f64>, SourceError>;
}

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("atlas-server/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// HTTP client for the country catalogue feed.
pub struct RestCountriesClient {
    client: Client,
    url: String,
}

impl RestCountriesClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CatalogueSource for RestCountriesClient {
    async fn fetch_countries(&self) -> Result<Vec<CatalogueCountry>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::unavailable(CATALOGUE_FEED, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::unavailable(
                CATALOGUE_FEED,
                format!("HTTP {}", status),
            ));
        }

        let countries: Vec<CatalogueCountry> = response
            .json()
            .await
            .map_err(|e| SourceError::unavailable(CATALOGUE_FEED, e))?;

        info!(count = countries.len(), "Fetched country catalogue");

        Ok(countries)
    }
}

/// HTTP client for the exchange-rate feed.
pub struct OpenErApiClient {
    client: Client,
    url: String,
}

impl OpenErApiClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RateSource for OpenErApiClient {
    async fn fetch_rates(&self) -> Result<HashMap<String, f64>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::unavailable(RATES_FEED, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::unavailable(
                RATES_FEED,
                format!("HTTP {}", status),
            ));
        }

        let envelope: RatesEnvelope = response
            .json()
            .await
            .map_err(|e| SourceError::unavailable(RATES_FEED, e))?;

        if envelope.result != "success" {
            return Err(SourceError::unavailable(
                RATES_FEED,
                format!("feed reported result '{}'", envelope.result),
            ));
        }

        info!(
            count = envelope.rates.len(),
            base = envelope.base_code.as_deref().unwrap_or("?"),
            "Fetched exchange rates"
        );

        Ok(envelope.rates)
    }
}
