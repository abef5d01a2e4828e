//! Immutable record of what a layer currently shows.
//!
//! A [`VisibleSnapshot`] bundles the rendered points with the features they
//! came from so both are replaced by a single pointer swap. Readers holding
//! an `Arc<VisibleSnapshot>` keep a consistent view for as long as they need.

use std::sync::Arc;

use geo::Rect;

use crate::{FeatureId, RemoteFeature, RenderablePoint};

/// Rendered points plus the feature cache, produced by one load cycle.
///
/// Features are sorted by id and unique; every point has exactly one feature
/// with the same id and vice versa.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleSnapshot {
    generation: u64,
    zoom: Option<u8>,
    envelope: Option<Rect<f64>>,
    points: Arc<[RenderablePoint]>,
    features: Arc<[RemoteFeature]>,
}

impl Default for VisibleSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl VisibleSnapshot {
    /// The state of a layer before its first successful cycle.
    pub fn empty() -> Self {
        Self {
            generation: 0,
            zoom: None,
            envelope: None,
            points: Arc::from(Vec::new()),
            features: Arc::from(Vec::new()),
        }
    }

    /// Assemble a snapshot from accepted points and features.
    ///
    /// `accepted` pairs each point with its source feature. Pairs are sorted
    /// by feature id; later duplicates of an id are dropped.
    pub fn from_accepted(
        generation: u64,
        zoom: u8,
        envelope: Rect<f64>,
        mut accepted: Vec<(RenderablePoint, RemoteFeature)>,
    ) -> Self {
        accepted.sort_by_key(|(_, feature)| feature.id);
        accepted.dedup_by_key(|(_, feature)| feature.id);
        let (points, features): (Vec<_>, Vec<_>) = accepted.into_iter().unzip();
        Self {
            generation,
            zoom: Some(zoom),
            envelope: Some(envelope),
            points: Arc::from(points),
            features: Arc::from(features),
        }
    }

    /// Monotonic cycle number; `0` for the initial empty snapshot.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Zoom level of the producing cycle.
    pub const fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    /// Envelope requested by the producing cycle.
    pub const fn envelope(&self) -> Option<Rect<f64>> {
        self.envelope
    }

    /// Rendered points, in the same order as [`Self::features`].
    pub fn points(&self) -> &[RenderablePoint] {
        &self.points
    }

    /// Cached features, sorted by id.
    pub fn features(&self) -> &[RemoteFeature] {
        &self.features
    }

    /// Look up a cached feature by id.
    pub fn feature(&self, id: FeatureId) -> Option<&RemoteFeature> {
        self.features
            .binary_search_by_key(&id, |feature| feature.id)
            .ok()
            .and_then(|index| self.features.get(index))
    }

    /// Ids of the cached features in ascending order.
    pub fn feature_ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.features.iter().map(|feature| feature.id)
    }

    /// Number of cached features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the snapshot holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
