//! API layer types shared by all feature routes

pub mod response;
