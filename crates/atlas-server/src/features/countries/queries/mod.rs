//! Read operations over the reconciled country set.

pub mod get;
pub mod list;

pub use get::GetCountryError;
pub use list::{ListCountriesError, ListCountriesQuery};
