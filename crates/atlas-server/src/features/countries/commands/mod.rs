//! Write operations on the country set.

pub mod delete;
pub mod refresh;

pub use delete::{DeleteCountryCommand, DeleteCountryError};
pub use refresh::RefreshCountriesResponse;
