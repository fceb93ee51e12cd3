//! Feature modules implementing the Atlas API
//!
//! Each feature is a vertical slice with its own commands (write
//! operations), queries (read operations), and routes:
//!
//! - **countries**: refresh pipeline trigger, listing with filters and
//!   sorting, single-record retrieval, deletion, and the summary image
//! - **status**: the aggregate sync status
//!
//! Handlers receive [`AppState`]; service objects are constructed once at
//! startup and shared by reference.

pub mod countries;
pub mod status;

use axum::Router;
use std::sync::Arc;

use crate::artifact::SummaryPublisher;
use crate::db::CountryStore;
use crate::sync::SyncService;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct AppState {
    /// Storage port for country snapshots and sync status
    pub store: Arc<dyn CountryStore>,
    /// The reconciliation pipeline
    pub sync: Arc<SyncService>,
    /// Summary artifact publisher; `None` when storage is not configured
    pub artifact: Option<Arc<SummaryPublisher>>,
}

/// Creates the API router with all feature routes mounted
pub fn router(state: AppState) -> Router<()> {
    Router::new()
        .nest("/countries", countries::countries_routes())
        .merge(status::status_routes())
        .with_state(state)
}
