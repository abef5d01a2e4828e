//! Query a remote service for features inside a bounding box.
//!
//! The `FeatureSearch` trait abstracts the place-search backend used by
//! [`FeatureLayer`](crate::FeatureLayer). Callers supply
//! [`SearchCriteria`](crate::SearchCriteria) and receive the matching
//! [`RemoteFeature`](crate::RemoteFeature) values.
//!
//! Transport and service failures are reported as [`SearchError`]; the layer
//! treats every one of them as "leave the visible set unchanged".

mod error;
mod provider;

pub use error::SearchError;
pub use provider::FeatureSearch;
