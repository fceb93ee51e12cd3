//! Country API routes
//!
//! - `POST /countries/refresh` - run the reconciliation pipeline
//! - `GET /countries` - list with filters and sorting
//! - `GET /countries/image` - redirect to the published summary artifact
//! - `GET /countries/:name` - get a single country by exact name
//! - `DELETE /countries/:name` - delete a country record

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::AppState;

use super::commands::{self, DeleteCountryCommand};
use super::queries::{self, ListCountriesQuery};

/// Creates the countries router with all routes configured
pub fn countries_routes() -> Router<AppState> {
    Router::new()
        .route("/refresh", post(refresh_countries))
        .route("/", get(list_countries))
        .route("/image", get(summary_image))
        .route("/:name", get(get_country))
        .route("/:name", delete(delete_country))
}

/// Fetch both feeds and reconcile the country set.
///
/// # Response
///
/// - `200 OK` - counts of inserted and updated records
/// - `503 Service Unavailable` - either feed unreachable or unsuccessful
#[tracing::instrument(skip(state))]
async fn refresh_countries(State(state): State<AppState>) -> Result<Response, AppError> {
    let response = commands::refresh::handle(state.sync.clone()).await?;

    tracing::info!(
        inserted = response.inserted,
        updated = response.updated,
        "Countries refreshed via API"
    );

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// List countries with optional filtering and sorting.
///
/// # Query Parameters
///
/// - `region` - exact-match region filter
/// - `currency` - exact-match currency code filter
/// - `sort` - one of `name_asc`, `name_desc`, `gdp_asc`, `gdp_desc`,
///   `population_asc`, `population_desc` (default `name_asc`)
#[tracing::instrument(skip(state, query))]
async fn list_countries(
    State(state): State<AppState>,
    Query(query): Query<ListCountriesQuery>,
) -> Result<Response, AppError> {
    let countries = queries::list::handle(state.store.clone(), query).await?;

    let meta = json!({ "count": countries.len() });

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success_with_meta(countries, meta)),
    )
        .into_response())
}

/// Redirect to the published summary image.
#[tracing::instrument(skip(state))]
async fn summary_image(State(state): State<AppState>) -> Result<Response, AppError> {
    let Some(publisher) = state.artifact.as_ref() else {
        return Err(AppError::NotFound("Summary image not found".to_string()));
    };

    let exists = publisher
        .exists()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !exists {
        return Err(AppError::NotFound("Summary image not found".to_string()));
    }

    Ok(Redirect::temporary(&publisher.url()).into_response())
}

/// Get a single country by exact name.
#[tracing::instrument(skip(state), fields(name = %name))]
async fn get_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let country = queries::get::handle(state.store.clone(), name).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(country))).into_response())
}

/// Delete a country record and recount the aggregate status.
#[tracing::instrument(skip(state), fields(name = %name))]
async fn delete_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    commands::delete::handle(state.store.clone(), DeleteCountryCommand { name }).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
