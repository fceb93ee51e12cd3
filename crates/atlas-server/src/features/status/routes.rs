//! Status API routes
//!
//! - `GET /status` - total countries and last refresh timestamp

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::AppState;

use super::queries;

/// Creates the status router
pub fn status_routes() -> Router<AppState> {
    Router::new().route("/status", get(get_status))
}

/// Aggregate status of the reconciled set.
#[tracing::instrument(skip(state))]
async fn get_status(State(state): State<AppState>) -> Result<Response, AppError> {
    let response = queries::get::handle(state.store.clone()).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}
