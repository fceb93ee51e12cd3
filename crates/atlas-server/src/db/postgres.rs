//! Postgres adapter for the country store.
//!
//! Filters and sort keys arrive at runtime, so the list query is assembled
//! with `QueryBuilder`; the `ORDER BY` arms are static strings. GDP sorts
//! order nulls last in both directions so countries without a computable
//! estimate never displace ranked entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

use super::{
    Country, CountryFilter, CountrySnapshot, CountryStore, SortKey, StoreError, SyncStatusRecord,
};

const COUNTRY_COLUMNS: &str = "id, name, capital, region, population, currency_code, \
     exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

#[derive(Clone)]
pub struct PgCountryStore {
    pool: PgPool,
}

impl PgCountryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SortKey {
    fn order_clause(self) -> &'static str {
        match self {
            SortKey::NameAsc => "name ASC",
            SortKey::NameDesc => "name DESC",
            SortKey::GdpAsc => "estimated_gdp ASC NULLS LAST",
            SortKey::GdpDesc => "estimated_gdp DESC NULLS LAST",
            SortKey::PopulationAsc => "population ASC",
            SortKey::PopulationDesc => "population DESC",
        }
    }
}

#[async_trait]
impl CountryStore for PgCountryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError> {
        let sql = format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE name = $1");
        let country = sqlx::query_as::<_, Country>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(country)
    }

    async fn insert(
        &self,
        snapshot: CountrySnapshot,
        refreshed_at: DateTime<Utc>,
    ) -> Result<Country, StoreError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO countries
                (id, name, capital, region, population, currency_code,
                 exchange_rate, estimated_gdp, flag_url, last_refreshed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(id)
        .bind(&snapshot.name)
        .bind(&snapshot.capital)
        .bind(&snapshot.region)
        .bind(snapshot.population)
        .bind(&snapshot.currency_code)
        .bind(snapshot.exchange_rate)
        .bind(snapshot.estimated_gdp)
        .bind(&snapshot.flag_url)
        .bind(refreshed_at)
        .execute(&self.pool)
        .await?;

        Ok(materialize(id, snapshot, refreshed_at))
    }

    async fn update(
        &self,
        id: Uuid,
        snapshot: CountrySnapshot,
        refreshed_at: DateTime<Utc>,
    ) -> Result<Country, StoreError> {
        sqlx::query(
            r#"
            UPDATE countries
            SET capital = $1, region = $2, population = $3, currency_code = $4,
                exchange_rate = $5, estimated_gdp = $6, flag_url = $7,
                last_refreshed_at = $8
            WHERE id = $9
            "#,
        )
        .bind(&snapshot.capital)
        .bind(&snapshot.region)
        .bind(snapshot.population)
        .bind(&snapshot.currency_code)
        .bind(snapshot.exchange_rate)
        .bind(snapshot.estimated_gdp)
        .bind(&snapshot.flag_url)
        .bind(refreshed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(materialize(id, snapshot, refreshed_at))
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM countries WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &CountryFilter) -> Result<Vec<Country>, StoreError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE 1 = 1"));

        if let Some(ref region) = filter.region {
            builder.push(" AND region = ").push_bind(region);
        }

        if let Some(ref currency) = filter.currency {
            builder.push(" AND currency_code = ").push_bind(currency);
        }

        builder.push(" ORDER BY ").push(filter.sort.order_clause());

        let countries = builder
            .build_query_as::<Country>()
            .fetch_all(&self.pool)
            .await?;

        Ok(countries)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM countries")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get::<i64, _>("count")?)
    }

    async fn top_by_gdp(&self, limit: i64) -> Result<Vec<Country>, StoreError> {
        let sql = format!(
            "SELECT {COUNTRY_COLUMNS} FROM countries \
             WHERE estimated_gdp IS NOT NULL \
             ORDER BY estimated_gdp DESC LIMIT $1"
        );
        let countries = sqlx::query_as::<_, Country>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(countries)
    }

    async fn status(&self) -> Result<Option<SyncStatusRecord>, StoreError> {
        let status = sqlx::query_as::<_, SyncStatusRecord>(
            "SELECT total_countries, last_refreshed_at FROM sync_status WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    async fn upsert_status(
        &self,
        total_countries: i64,
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sync_status (id, total_countries, last_refreshed_at)
            VALUES (1, $1, $2)
            ON CONFLICT (id) DO UPDATE
            SET total_countries = EXCLUDED.total_countries,
                last_refreshed_at = EXCLUDED.last_refreshed_at
            "#,
        )
        .bind(total_countries)
        .bind(refreshed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_status_total(&self, total_countries: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE sync_status SET total_countries = $1 WHERE id = 1")
            .bind(total_countries)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn materialize(id: Uuid, snapshot: CountrySnapshot, refreshed_at: DateTime<Utc>) -> Country {
    Country {
        id,
        name: snapshot.name,
        capital: snapshot.capital,
        region: snapshot.region,
        population: snapshot.population,
        currency_code: snapshot.currency_code,
        exchange_rate: snapshot.exchange_rate,
        estimated_gdp: snapshot.estimated_gdp,
        flag_url: snapshot.flag_url,
        last_refreshed_at: refreshed_at,
    }
}
