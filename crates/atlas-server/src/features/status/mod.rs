//! Sync status feature slice.

pub mod queries;
pub mod routes;

pub use routes::status_routes;
