//! Viewport-driven loading of remote features into a map layer.
//!
//! A [`FeatureLayer`] owns everything a load cycle touches: the search
//! backend, the projection, the style configuration, the published
//! [`VisibleSnapshot`] and the list of dependent overlays. The map view calls
//! [`FeatureLayer::calculate_visible_elements`] whenever the viewport
//! changes; the call returns immediately and the cycle runs on the Tokio
//! runtime supplied at construction.
//!
//! # Cycle
//!
//! 1. Inverse-project the envelope into a [`BoundingBox`](crate::BoundingBox).
//! 2. Search with the configured row cap, query and language.
//! 3. Project every result, drop those outside the envelope and select the
//!    point style for the zoom.
//! 4. Swap the new snapshot in and notify registered overlays.
//!
//! A failed or timed-out search leaves the previous snapshot untouched.
//! Cycles of one layer run one at a time in request order, and issuing a new
//! request cancels the previous one.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use geo::Coord;
//! use waymark_core::test_support::StubFeatureSearch;
//! use waymark_core::{
//!     BoundingBox, FeatureLayer, LayerConfig, PointStyle, RemoteFeature, StyleSet, WebMercator,
//! };
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
//! let search = Arc::new(StubFeatureSearch::with_features(vec![
//!     RemoteFeature::new(1, "Tallinn", Coord { x: 24.75, y: 59.44 }),
//! ]));
//! let config = LayerConfig::new(StyleSet::new().with_style(5, PointStyle::new(6.0, 0xff00_00ff)));
//! let layer = FeatureLayer::new(search, Arc::new(WebMercator), config, runtime.handle().clone());
//!
//! let bbox = BoundingBox::from_corners(Coord { x: 24.0, y: 59.0 }, Coord { x: 25.0, y: 60.0 });
//! let envelope = bbox.to_envelope(&WebMercator);
//! let outcome = runtime.block_on(layer.load(envelope, 10));
//!
//! assert!(outcome.is_published());
//! assert_eq!(layer.snapshot().len(), 1);
//! # Ok::<(), std::io::Error>(())
//! ```

mod config;
mod shared;
mod task;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use geo::Rect;
use log::debug;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::{FeatureOverlay, FeatureSearch, Projection, RemoteFeature, VisibleSnapshot};

pub use config::{DEFAULT_CYCLE_TIMEOUT, LayerConfig};
pub use task::{LoadHandle, LoadOutcome, LoadTask};

use shared::LayerShared;

/// A map layer whose contents come from a remote feature search.
pub struct FeatureLayer {
    shared: Arc<LayerShared>,
    executor: Handle,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl fmt::Debug for FeatureLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureLayer")
            .field("min_zoom", &self.min_zoom())
            .field("generation", &self.shared.last_generation())
            .field("visible", &self.shared.snapshot.load().len())
            .field("overlays", &self.overlay_count())
            .finish_non_exhaustive()
    }
}

impl FeatureLayer {
    /// Create a layer that spawns its load cycles on `executor`.
    pub fn new(
        search: Arc<dyn FeatureSearch>,
        projection: Arc<dyn Projection>,
        config: LayerConfig,
        executor: Handle,
    ) -> Self {
        debug!("feature layer min zoom = {:?}", config.min_zoom());
        Self {
            shared: Arc::new(LayerShared::new(search, projection, config)),
            executor,
            in_flight: Mutex::new(None),
        }
    }

    /// Smallest zoom at which the layer loads; `None` if it never does.
    pub fn min_zoom(&self) -> Option<u8> {
        self.shared.config.min_zoom()
    }

    /// Configuration the layer was built with.
    pub fn config(&self) -> &LayerConfig {
        &self.shared.config
    }

    /// Projection of envelopes and points.
    pub fn projection(&self) -> &dyn Projection {
        self.shared.projection.as_ref()
    }

    /// Whether a request at `zoom` would reach the search service.
    pub fn accepts_zoom(&self, zoom: u8) -> bool {
        self.min_zoom().is_some_and(|min| zoom >= min)
    }

    /// Start loading the features visible in `envelope` at `zoom`.
    ///
    /// Returns `None` without touching the network when `zoom` is below the
    /// layer's minimum. Otherwise any in-flight cycle of this layer is
    /// cancelled and a new one is spawned; the returned handle can be
    /// awaited or ignored.
    pub fn calculate_visible_elements(&self, envelope: Rect<f64>, zoom: u8) -> Option<LoadHandle> {
        let task = self.prepare(envelope, zoom)?;
        let generation = task.generation();
        let token = task.token().clone();
        let shared = Arc::clone(&self.shared);
        let join = self
            .executor
            .spawn(async move { shared.run_cycle(task).await });
        Some(LoadHandle::new(generation, token, join))
    }

    /// Run a cycle for `envelope` at `zoom` on the current task.
    ///
    /// Behaves like [`Self::calculate_visible_elements`] but waits for the
    /// outcome instead of spawning.
    pub async fn load(&self, envelope: Rect<f64>, zoom: u8) -> LoadOutcome {
        match self.prepare(envelope, zoom) {
            Some(task) => self.shared.run_cycle(task).await,
            None => LoadOutcome::Skipped,
        }
    }

    /// Cancel the most recently issued cycle, if it is still running.
    pub fn cancel_pending(&self) {
        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = previous {
            token.cancel();
        }
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<VisibleSnapshot> {
        self.shared.snapshot.load_full()
    }

    /// Copy of the cached features of the current snapshot.
    pub fn visible_features(&self) -> Vec<RemoteFeature> {
        self.shared.snapshot.load().features().to_vec()
    }

    /// Notify `overlay` after every snapshot this layer publishes.
    pub fn register_overlay(&self, overlay: Arc<dyn FeatureOverlay>) {
        self.shared.overlays.rcu(|current| {
            let mut next: Vec<Arc<dyn FeatureOverlay>> = current.iter().cloned().collect();
            next.push(Arc::clone(&overlay));
            next
        });
    }

    /// Number of registered overlays.
    pub fn overlay_count(&self) -> usize {
        self.shared.overlays.load().len()
    }

    fn prepare(&self, envelope: Rect<f64>, zoom: u8) -> Option<LoadTask> {
        if !self.accepts_zoom(zoom) {
            debug!("zoom {zoom} below layer minimum {:?}; skipping", self.min_zoom());
            return None;
        }
        let task = self.shared.next_task(envelope, zoom);
        let superseded = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task.token().clone());
        if let Some(token) = superseded {
            token.cancel();
        }
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingOverlay, StubFeatureSearch, estonia_envelope};
    use crate::{PointStyle, SearchCriteria, SearchError, StyleSet, WebMercator};
    use async_trait::async_trait;
    use geo::Coord;
    use rstest::{fixture, rstest};
    use std::sync::OnceLock;
    use std::time::Duration;

    /// Search that cancels the cycle's token just as its results come back.
    struct CancelOnReturn {
        features: Vec<RemoteFeature>,
        token: OnceLock<CancellationToken>,
    }

    #[async_trait]
    impl FeatureSearch for CancelOnReturn {
        async fn search(
            &self,
            _criteria: &SearchCriteria,
        ) -> Result<Vec<RemoteFeature>, SearchError> {
            if let Some(token) = self.token.get() {
                token.cancel();
            }
            Ok(self.features.clone())
        }
    }

    fn config() -> LayerConfig {
        LayerConfig::new(StyleSet::new().with_style(5, PointStyle::new(6.0, 0xff00_00ff)))
    }

    fn layer(search: Arc<StubFeatureSearch>) -> FeatureLayer {
        FeatureLayer::new(search, Arc::new(WebMercator), config(), Handle::current())
    }

    #[fixture]
    fn features() -> Vec<RemoteFeature> {
        vec![
            RemoteFeature::new(1, "Tallinn", Coord { x: 24.75, y: 58.9 }),
            RemoteFeature::new(2, "Haapsalu", Coord { x: 24.3, y: 58.5 }),
        ]
    }

    #[rstest]
    #[tokio::test]
    async fn below_min_zoom_is_a_no_op(features: Vec<RemoteFeature>) {
        let search = Arc::new(StubFeatureSearch::with_features(features));
        let layer = layer(Arc::clone(&search));
        assert!(layer.calculate_visible_elements(estonia_envelope(), 4).is_none());
        assert_eq!(layer.load(estonia_envelope(), 4).await, LoadOutcome::Skipped);
        assert_eq!(search.calls(), 0);
        assert_eq!(layer.snapshot().generation(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn layer_without_styles_never_loads(features: Vec<RemoteFeature>) {
        let search = Arc::new(StubFeatureSearch::with_features(features));
        let layer = FeatureLayer::new(
            Arc::clone(&search) as Arc<dyn FeatureSearch>,
            Arc::new(WebMercator),
            LayerConfig::default(),
            Handle::current(),
        );
        assert_eq!(layer.min_zoom(), None);
        assert_eq!(layer.load(estonia_envelope(), 20).await, LoadOutcome::Skipped);
        assert_eq!(search.calls(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn successful_cycle_publishes_and_notifies(features: Vec<RemoteFeature>) {
        let search = Arc::new(StubFeatureSearch::with_features(features));
        let layer = layer(Arc::clone(&search));
        let overlay = Arc::new(RecordingOverlay::default());
        layer.register_overlay(Arc::clone(&overlay) as Arc<dyn FeatureOverlay>);

        let outcome = layer.load(estonia_envelope(), 10).await;

        assert_eq!(
            outcome,
            LoadOutcome::Published {
                generation: 1,
                accepted: 2,
                discarded: 0
            }
        );
        let snapshot = layer.snapshot();
        assert_eq!(snapshot.feature_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert!(snapshot.points().iter().all(|p| p.style.is_some()));
        let calls = overlay.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 10);
        assert_eq!(calls[0].0, snapshot.features().to_vec());
    }

    #[rstest]
    #[tokio::test]
    async fn criteria_carry_config_and_inverse_projected_bbox() {
        let search = Arc::new(StubFeatureSearch::with_features(Vec::new()));
        let layer = FeatureLayer::new(
            Arc::clone(&search) as Arc<dyn FeatureSearch>,
            Arc::new(WebMercator),
            config().with_max_rows(20).with_query("museum").with_language("et"),
            Handle::current(),
        );

        layer.load(estonia_envelope(), 10).await;

        let criteria = search.last_criteria().expect("search was called");
        assert_eq!(criteria.max_rows, 20);
        assert_eq!(criteria.query.as_deref(), Some("museum"));
        assert_eq!(criteria.language.as_deref(), Some("et"));
        assert!((criteria.bbox.west - 24.0).abs() < 1e-9);
        assert!((criteria.bbox.north - 59.0).abs() < 1e-9);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_response_publishes_empty_snapshot(features: Vec<RemoteFeature>) {
        let search = Arc::new(StubFeatureSearch::with_features(features));
        let layer = layer(Arc::clone(&search));
        layer.load(estonia_envelope(), 10).await;
        search.respond_next(Ok(Vec::new()));

        let outcome = layer.load(estonia_envelope(), 10).await;

        assert!(outcome.is_published());
        assert!(layer.snapshot().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn failure_keeps_previous_snapshot(features: Vec<RemoteFeature>) {
        let search = Arc::new(StubFeatureSearch::with_features(features));
        let layer = layer(Arc::clone(&search));
        layer.load(estonia_envelope(), 10).await;
        let before = layer.snapshot();
        search.respond_next(Err(SearchError::Service {
            code: 18,
            message: "daily limit exceeded".to_owned(),
        }));

        let outcome = layer.load(estonia_envelope(), 10).await;

        assert!(matches!(outcome, LoadOutcome::Failed(SearchError::Service { code: 18, .. })));
        assert!(Arc::ptr_eq(&before, &layer.snapshot()));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn slow_search_times_out(features: Vec<RemoteFeature>) {
        let search = Arc::new(StubFeatureSearch::with_features(features));
        search.hang_next();
        let layer = FeatureLayer::new(
            Arc::clone(&search) as Arc<dyn FeatureSearch>,
            Arc::new(WebMercator),
            config().with_timeout(Duration::from_secs(2)),
            Handle::current(),
        );

        let outcome = layer.load(estonia_envelope(), 10).await;

        assert_eq!(
            outcome,
            LoadOutcome::Failed(SearchError::Timeout {
                timeout: Duration::from_secs(2)
            })
        );
        assert_eq!(layer.snapshot().generation(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn newer_request_cancels_in_flight_one(features: Vec<RemoteFeature>) {
        let search = Arc::new(StubFeatureSearch::with_features(features));
        search.hang_next();
        let layer = layer(Arc::clone(&search));

        let first = layer
            .calculate_visible_elements(estonia_envelope(), 10)
            .expect("zoom accepted");
        search.wait_for_calls(1).await;
        let second = layer
            .calculate_visible_elements(estonia_envelope(), 11)
            .expect("zoom accepted");

        assert_eq!(first.join().await.expect("first joins"), LoadOutcome::Cancelled);
        assert!(second.join().await.expect("second joins").is_published());
        assert_eq!(layer.snapshot().zoom(), Some(11));
        assert_eq!(layer.snapshot().generation(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn queued_request_is_cancelled_without_searching(features: Vec<RemoteFeature>) {
        let search = Arc::new(StubFeatureSearch::with_features(features));
        search.hang_next();
        let layer = layer(Arc::clone(&search));

        let first = layer
            .calculate_visible_elements(estonia_envelope(), 10)
            .expect("zoom accepted");
        search.wait_for_calls(1).await;
        let second = layer
            .calculate_visible_elements(estonia_envelope(), 11)
            .expect("zoom accepted");
        let third = layer
            .calculate_visible_elements(estonia_envelope(), 12)
            .expect("zoom accepted");

        assert_eq!(first.join().await.expect("first joins"), LoadOutcome::Cancelled);
        assert_eq!(second.join().await.expect("second joins"), LoadOutcome::Cancelled);
        assert!(third.join().await.expect("third joins").is_published());
        assert_eq!(search.calls(), 2);
        assert_eq!(layer.snapshot().zoom(), Some(12));
        assert_eq!(layer.snapshot().generation(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn cancel_after_results_arrive_still_publishes(features: Vec<RemoteFeature>) {
        let search = Arc::new(CancelOnReturn {
            features,
            token: OnceLock::new(),
        });
        let layer = FeatureLayer::new(
            Arc::clone(&search) as Arc<dyn FeatureSearch>,
            Arc::new(WebMercator),
            config(),
            Handle::current(),
        );
        let task = layer.prepare(estonia_envelope(), 10).expect("zoom accepted");
        let token = task.token().clone();
        search
            .token
            .set(token.clone())
            .expect("token set once");

        let outcome = layer.shared.run_cycle(task).await;

        assert!(token.is_cancelled());
        assert_eq!(
            outcome,
            LoadOutcome::Published {
                generation: 1,
                accepted: 2,
                discarded: 0
            }
        );
        assert_eq!(layer.snapshot().len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn cancel_pending_stops_the_latest_cycle(features: Vec<RemoteFeature>) {
        let search = Arc::new(StubFeatureSearch::with_features(features));
        search.hang_next();
        let layer = layer(Arc::clone(&search));

        let handle = layer
            .calculate_visible_elements(estonia_envelope(), 10)
            .expect("zoom accepted");
        search.wait_for_calls(1).await;
        layer.cancel_pending();

        assert_eq!(handle.join().await.expect("joins"), LoadOutcome::Cancelled);
        assert_eq!(layer.snapshot().generation(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn overlays_accumulate_in_registration_list() {
        let search = Arc::new(StubFeatureSearch::with_features(Vec::new()));
        let layer = layer(search);
        layer.register_overlay(Arc::new(RecordingOverlay::default()));
        layer.register_overlay(Arc::new(RecordingOverlay::default()));
        assert_eq!(layer.overlay_count(), 2);
    }
}
