//! Country feature slice: refresh, list, get, delete, summary image.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::countries_routes;
