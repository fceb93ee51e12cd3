//! Atlas Server - Main entry point

use anyhow::Result;
use atlas_common::logging::{init_logging, LogConfig};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use atlas_server::{
    artifact::SummaryPublisher,
    config::Config,
    db::{CountryStore, PgCountryStore},
    features::{self, AppState},
    middleware,
    storage::{Storage, StorageConfig},
    sync::{OpenErApiClient, RefreshScheduler, RestCountriesClient, SyncService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("atlas-server".to_string())
        .filter_directives("atlas_server=debug,tower_http=debug,sqlx=info".to_string())
        .build();
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    info!("Starting Atlas Server");

    // Load configuration
    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(&config.database.url)
        .await?;

    info!("Database connection pool established");

    // Run migrations
    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    let store: Arc<dyn CountryStore> = Arc::new(PgCountryStore::new(db_pool));

    // Feed clients
    let catalogue = RestCountriesClient::new(
        config.sources.countries_url.clone(),
        config.sources.timeout(),
    )?;
    let rates = OpenErApiClient::new(config.sources.rates_url.clone(), config.sources.timeout())?;

    // Artifact storage is optional; without it the pipeline skips
    // regeneration and the image endpoint reports NotFound.
    let artifact = match StorageConfig::from_env() {
        Ok(storage_config) => {
            let storage = Storage::new(storage_config);
            Some(Arc::new(SummaryPublisher::new(store.clone(), storage)))
        },
        Err(e) => {
            info!("Artifact storage disabled: {}", e);
            None
        },
    };

    // Assemble the reconciliation pipeline
    let mut sync = SyncService::new(store.clone(), Arc::new(catalogue), Arc::new(rates))
        .with_batch_size(config.sync.batch_size)
        .with_artifact_timeout(config.sync.artifact_timeout());
    if let Some(ref publisher) = artifact {
        sync = sync.with_publisher(publisher.clone());
    }
    let sync = Arc::new(sync);

    // Optional periodic refresh
    let _scheduler_handle = if config.sync.auto_refresh {
        info!("Auto refresh is enabled, starting scheduler");
        Some(RefreshScheduler::new(sync.clone(), config.sync.refresh_interval()).start())
    } else {
        None
    };

    // Create application state
    let state = AppState {
        store,
        sync,
        artifact,
    };

    // Build the application router
    let app = create_router(state, &config);

    // Create socket address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state.clone())
        .merge(features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Service index
async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Country Currency & Exchange API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "refresh": "POST /countries/refresh",
            "getAll": "GET /countries",
            "getOne": "GET /countries/:name",
            "delete": "DELETE /countries/:name",
            "status": "GET /status",
            "image": "GET /countries/image",
        },
    }))
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    match state.store.count().await {
        Ok(_) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give ongoing requests time to complete
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
