//! Remote data adapters for the Waymark engine.
//!
//! Responsibilities:
//! - Implement the search traits from `waymark-core` against real services.
//! - Own the wire formats of those services.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `waymark-core`).
//! - Stay async end to end; callers drive requests on their own runtime.

pub mod geonames;

pub use geonames::{GeoNamesConfig, GeoNamesSearch, SearchBuildError};
