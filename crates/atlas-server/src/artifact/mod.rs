//! Summary artifact
//!
//! After each successful refresh the pipeline regenerates a small data card
//! (total countries, top five by estimated GDP, last refresh time) and
//! publishes it to blob storage under a fixed key. The card is rendered as
//! an 800x600 SVG so regeneration needs no browser or raster toolchain.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::db::{Country, CountryStore};
use crate::storage::Storage;

/// Object key the summary is published under.
pub const SUMMARY_KEY: &str = "summary.svg";

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const TOP_COUNTRIES: i64 = 5;

pub struct SummaryPublisher {
    store: Arc<dyn CountryStore>,
    storage: Storage,
}

impl SummaryPublisher {
    pub fn new(store: Arc<dyn CountryStore>, storage: Storage) -> Self {
        Self { store, storage }
    }

    /// Render the current summary and upload it. Returns the public URL.
    #[instrument(skip(self))]
    pub async fn publish(&self) -> Result<String> {
        let total = self.store.count().await?;
        let top = self.store.top_by_gdp(TOP_COUNTRIES).await?;
        let last_refreshed = self
            .store
            .status()
            .await?
            .map(|s| s.last_refreshed_at)
            .unwrap_or_else(Utc::now);

        let svg = render_summary(total, &top, last_refreshed);
        debug!(bytes = svg.len(), "Rendered summary card");

        self.storage
            .upload(SUMMARY_KEY, svg.into_bytes(), "image/svg+xml")
            .await
    }

    pub async fn exists(&self) -> Result<bool> {
        self.storage.exists(SUMMARY_KEY).await
    }

    pub fn url(&self) -> String {
        self.storage.public_url(SUMMARY_KEY)
    }
}

/// Render the data card. Layout mirrors the API summary: header, total,
/// ranked top-five list, refresh footer.
fn render_summary(total: i64, top: &[Country], last_refreshed: DateTime<Utc>) -> String {
    let mut items = String::new();
    for (index, country) in top.iter().enumerate() {
        let gdp = match country.estimated_gdp {
            Some(gdp) => format!("${:.2}B", gdp / 1e9),
            None => "N/A".to_string(),
        };
        items.push_str(&format!(
            r#"  <text x="90" y="{}" class="item">{}. {} - {}</text>
"#,
            330 + index * 34,
            index + 1,
            escape_text(&country.name),
            gdp
        ));
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">
  <defs>
    <linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0%" stop-color="#1a1a2e"/>
      <stop offset="100%" stop-color="#16213e"/>
    </linearGradient>
  </defs>
  <style>
    text {{ font-family: Arial, sans-serif; }}
    .title {{ fill: #ffffff; font-size: 36px; font-weight: bold; }}
    .subtitle {{ fill: #a8dadc; font-size: 20px; }}
    .total {{ fill: #f1faee; font-size: 28px; font-weight: bold; }}
    .top-header {{ fill: #e63946; font-size: 24px; font-weight: bold; }}
    .item {{ fill: #ffffff; font-size: 18px; }}
    .footer {{ fill: #a8dadc; font-size: 16px; }}
  </style>
  <rect width="{WIDTH}" height="{HEIGHT}" fill="url(#bg)"/>
  <text x="400" y="80" text-anchor="middle" class="title">Country Currency &amp; Exchange</text>
  <text x="400" y="115" text-anchor="middle" class="subtitle">Data Summary</text>
  <text x="70" y="220" class="total">Total Countries: {total}</text>
  <text x="70" y="280" class="top-header">Top 5 Countries by GDP:</text>
{items}  <line x1="70" y1="540" x2="730" y2="540" stroke="#457b9d" stroke-width="2"/>
  <text x="400" y="575" text-anchor="middle" class="footer">Last Refreshed: {}</text>
</svg>
"##,
        last_refreshed.to_rfc2822()
    )
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
