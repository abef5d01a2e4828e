//! Core domain types for the Waymark feature-loading engine.
//!
//! The crate models the viewport-driven loader that sits between a map view
//! and a remote place-search service. A [`FeatureLayer`] turns a
//! projection-space envelope into a [`SearchCriteria`], asks a
//! [`FeatureSearch`] implementation for matching [`RemoteFeature`]s, converts
//! them into [`RenderablePoint`]s and publishes the result as an immutable
//! [`VisibleSnapshot`]. Registered [`FeatureOverlay`]s are notified after each
//! publish so they can derive their own view without a second fetch.

#![forbid(unsafe_code)]

pub mod bbox;
pub mod feature;
pub mod layer;
pub mod overlay;
pub mod point;
pub mod projection;
pub mod search;
pub mod snapshot;
pub mod style;

#[doc(hidden)]
pub mod test_support;

pub use bbox::{BoundingBox, DEFAULT_MAX_ROWS, MAX_ROWS_LIMIT, SearchCriteria};
pub use feature::{FeatureId, RemoteFeature};
pub use layer::{
    DEFAULT_CYCLE_TIMEOUT, FeatureLayer, LayerConfig, LoadHandle, LoadOutcome, LoadTask,
};
pub use overlay::{FeatureOverlay, LabelOverlay, TextLabel};
pub use point::{Label, RenderablePoint};
pub use projection::{Projection, WebMercator, Wgs84};
pub use search::{FeatureSearch, SearchError};
pub use snapshot::VisibleSnapshot;
pub use style::{LabelStyle, PointStyle, StyleSet};
