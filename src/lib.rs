//! Facade crate for the Waymark feature-loading engine.
//!
//! This crate re-exports the core loader types and exposes the GeoNames
//! search adapter behind the `geonames` feature.

#![forbid(unsafe_code)]

pub use waymark_core::{
    BoundingBox, FeatureId, FeatureLayer, FeatureOverlay, FeatureSearch, Label, LabelOverlay,
    LabelStyle, LayerConfig, LoadHandle, LoadOutcome, LoadTask, PointStyle, Projection,
    RemoteFeature, RenderablePoint, SearchCriteria, SearchError, StyleSet, TextLabel,
    VisibleSnapshot, WebMercator, Wgs84,
};

#[cfg(feature = "geonames")]
pub use waymark_data::{GeoNamesConfig, GeoNamesSearch, SearchBuildError};
