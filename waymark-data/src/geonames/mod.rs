//! GeoNames place search.
//!
//! [`GeoNamesSearch`] implements [`waymark_core::FeatureSearch`] on top of
//! the GeoNames `searchJSON` endpoint. Every request carries the account
//! name from [`GeoNamesConfig`]; the public service rejects anonymous calls.

mod provider;
mod response;

pub use provider::{
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, GeoNamesConfig, GeoNamesSearch,
    SearchBuildError,
};
