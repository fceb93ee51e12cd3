//! Shared infrastructure for Atlas components.
//!
//! Currently this crate hosts the logging setup used by every binary in the
//! workspace. Components configure a [`logging::LogConfig`] (defaults,
//! builder, or environment) and call [`logging::init_logging`] once at
//! startup.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
