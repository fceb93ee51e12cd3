//! Country reconciliation pipeline
//!
//! - **sources**: adapters for the two external feeds (country catalogue,
//!   exchange rates), behind traits so the engine can be tested with stubs
//! - **multiplier**: the injected random source for the GDP estimate
//! - **engine**: the pipeline itself (fan-out fetch, derive, batched upsert,
//!   status upkeep, detached artifact regeneration)
//! - **scheduler**: optional periodic re-run of the pipeline

pub mod engine;
pub mod multiplier;
pub mod scheduler;
pub mod sources;

pub use engine::{SyncError, SyncOutcome, SyncService};
pub use multiplier::{FixedMultiplier, GdpMultiplier, UniformMultiplier};
pub use scheduler::RefreshScheduler;
pub use sources::{
    CatalogueCountry, CatalogueCurrency, CatalogueSource, OpenErApiClient, RateSource,
    RestCountriesClient, SourceError,
};
