//! Atlas Server Library
//!
//! HTTP service that reconciles country records against two external feeds
//! (a country catalogue and a currency exchange-rate feed), persists the
//! merged snapshots, and serves filtered/sorted retrieval over them.
//!
//! # Overview
//!
//! - **Reconciliation pipeline**: concurrent fetch of both feeds, join by
//!   currency code, derived GDP estimate, batched upsert by country name,
//!   aggregate status upkeep ([`sync`]).
//! - **Query layer**: region/currency filters and six sort keys over the
//!   reconciled set ([`features::countries`], [`features::status`]).
//! - **Summary artifact**: best-effort SVG data card published to
//!   S3-compatible storage after each successful refresh ([`artifact`]).
//! - **Storage port**: all persistence goes through the [`db::CountryStore`]
//!   trait, with a Postgres adapter for production and an in-memory adapter
//!   for tests.
//!
//! # Architecture
//!
//! Features are organized as vertical slices: `commands/` for write
//! operations, `queries/` for reads, `routes.rs` wiring them to Axum
//! handlers. Service objects are constructed once at startup and shared via
//! router state; nothing reaches for global singletons.

pub mod api;
pub mod artifact;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod storage;
pub mod sync;

// Re-export commonly used types
pub use error::{AppError, AppResult};
