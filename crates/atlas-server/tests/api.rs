//! Router-level tests against the in-memory store.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use atlas_server::db::{CountryStore, InMemoryCountryStore};
use atlas_server::features::{self, AppState};
use atlas_server::sync::{
    CatalogueCountry, CatalogueCurrency, CatalogueSource, FixedMultiplier, RateSource,
    SourceError, SyncService,
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

fn entry(name: &str, population: i64, code: Option<&str>) -> CatalogueCountry {
    CatalogueCountry {
        name: name.to_string(),
        capital: None,
        region: Some("Africa".to_string()),
        population,
        flag: None,
        currencies: code
            .map(|c| {
                vec![CatalogueCurrency {
                    code: Some(c.to_string()),
                    name: None,
                    symbol: None,
                }]
            })
            .unwrap_or_default(),
    }
}

fn test_app() -> (Router, Arc<InMemoryCountryStore>) {
    let store = Arc::new(InMemoryCountryStore::new());
    let catalogue = vec![
        entry("Chad", 16_425_864, Some("XAF")),
        entry("Mali", 20_250_833, Some("XOF")),
    ];
    let rates = HashMap::from([("XAF".to_string(), 600.0), ("XOF".to_string(), 600.0)]);

    let sync = SyncService::new(
        store.clone() as Arc<dyn CountryStore>,
        Arc::new(StubCatalogue(catalogue)),
        Arc::new(StubRates(rates)),
    )
    .with_multiplier(Arc::new(FixedMultiplier(1500.0)));

    let state = AppState {
        store: store.clone(),
        sync: Arc::new(sync),
        artifact: None,
    };

    (features::router(state), store)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn status_synthesizes_default_before_first_refresh() {
    let (app, _store) = test_app();

    let response = app
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], serde_json::json!(true));
    assert_eq!(body["data"]["total_countries"], serde_json::json!(0));
}

#[tokio::test]
async fn refresh_then_query_flow() {
    let (app, _store) = test_app();

    // Refresh
    let response = app
        .clone()
        .oneshot(
            Request::post("/countries/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["inserted"], serde_json::json!(2));
    assert_eq!(body["data"]["updated"], serde_json::json!(0));

    // List, largest population first
    let response = app
        .clone()
        .oneshot(
            Request::get("/countries?sort=population_desc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Mali", "Chad"]);
    assert_eq!(body["meta"]["count"], serde_json::json!(2));

    // Single lookup
    let response = app
        .clone()
        .oneshot(Request::get("/countries/Chad").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["currency_code"], serde_json::json!("XAF"));

    // Status reflects the refresh
    let response = app
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_countries"], serde_json::json!(2));
}

#[tokio::test]
async fn unknown_country_is_404() {
    let (app, _store) = test_app();

    let response = app
        .oneshot(
            Request::get("/countries/Atlantis")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], serde_json::json!("NOT_FOUND"));
}

#[tokio::test]
async fn invalid_sort_value_is_rejected_with_field_details() {
    let (app, _store) = test_app();

    let response = app
        .oneshot(
            Request::get("/countries?sort=gdp")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], serde_json::json!("VALIDATION_ERROR"));
    assert!(body["error"]["details"]["sort"]
        .as_str()
        .unwrap()
        .contains("gdp_asc"));
}

#[tokio::test]
async fn delete_returns_no_content_then_not_found() {
    let (app, _store) = test_app();

    app.clone()
        .oneshot(
            Request::post("/countries/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::delete("/countries/Chad")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(
            Request::delete("/countries/Chad")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The aggregate follows the row count down.
    let response = app
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_countries"], serde_json::json!(1));
}

#[tokio::test]
async fn summary_image_is_404_without_artifact_storage() {
    let (app, _store) = test_app();

    let response = app
        .oneshot(
            Request::get("/countries/image")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
