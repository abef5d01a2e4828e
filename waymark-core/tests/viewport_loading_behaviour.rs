//! Behavioural tests for `FeatureLayer` load cycles.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;
use waymark_core::test_support::{
    RecordingOverlay, StubFeatureSearch, estonia_envelope, estonia_features,
};
use waymark_core::{
    FeatureLayer, FeatureOverlay, LayerConfig, LoadOutcome, PointStyle, SearchError, StyleSet,
    WebMercator,
};

struct LayerWorld {
    runtime: Runtime,
    search: Arc<StubFeatureSearch>,
    layer: FeatureLayer,
}

impl LayerWorld {
    fn load(&self, zoom: u8) -> LoadOutcome {
        self.runtime
            .block_on(self.layer.load(estonia_envelope(), zoom))
    }
}

#[fixture]
fn world() -> LayerWorld {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime");
    let search = Arc::new(StubFeatureSearch::with_features(Vec::new()));
    let config = LayerConfig::new(StyleSet::new().with_style(5, PointStyle::new(6.0, 0xff00_00ff)));
    let layer = FeatureLayer::new(
        Arc::clone(&search) as Arc<_>,
        Arc::new(WebMercator),
        config,
        runtime.handle().clone(),
    );
    LayerWorld {
        runtime,
        search,
        layer,
    }
}

#[fixture]
fn outcome() -> RefCell<Option<LoadOutcome>> {
    RefCell::new(None)
}

#[fixture]
fn overlays() -> RefCell<Vec<Arc<RecordingOverlay>>> {
    RefCell::new(Vec::new())
}

#[given("a search service returning three places around Estonia")]
fn given_places(#[from(world)] world: &LayerWorld) {
    world.search.respond_next(Ok(estonia_features()));
}

#[given("the layer has loaded the Estonia viewport at zoom {zoom}")]
fn given_loaded(#[from(world)] world: &LayerWorld, zoom: u8) {
    assert!(world.load(zoom).is_published());
}

#[given("the search service fails with a network error")]
fn given_failure(#[from(world)] world: &LayerWorld) {
    world.search.respond_next(Err(SearchError::Network {
        url: "http://api.geonames.org/searchJSON".into(),
        message: "connection refused".into(),
    }));
}

#[given("{count} recording overlays are registered")]
fn given_overlays(
    #[from(world)] world: &LayerWorld,
    #[from(overlays)] overlays: &RefCell<Vec<Arc<RecordingOverlay>>>,
    count: usize,
) {
    for _ in 0..count {
        let overlay = Arc::new(RecordingOverlay::default());
        world
            .layer
            .register_overlay(Arc::clone(&overlay) as Arc<dyn FeatureOverlay>);
        overlays.borrow_mut().push(overlay);
    }
}

#[when("the layer loads the Estonia viewport at zoom {zoom}")]
fn when_load(
    #[from(world)] world: &LayerWorld,
    #[from(outcome)] outcome: &RefCell<Option<LoadOutcome>>,
    zoom: u8,
) {
    *outcome.borrow_mut() = Some(world.load(zoom));
}

#[then("the snapshot holds {count} features")]
fn then_features(#[from(world)] world: &LayerWorld, count: usize) {
    assert_eq!(world.layer.snapshot().features().len(), count);
}

#[then("the snapshot holds {count} renderable points")]
fn then_points(#[from(world)] world: &LayerWorld, count: usize) {
    let snapshot = world.layer.snapshot();
    assert_eq!(snapshot.points().len(), count);
    assert!(
        snapshot
            .points()
            .iter()
            .all(|point| point.intersects(&estonia_envelope()))
    );
}

#[then("{count} returned feature was discarded")]
fn then_discarded(#[from(outcome)] outcome: &RefCell<Option<LoadOutcome>>, count: usize) {
    match outcome.borrow().as_ref() {
        Some(LoadOutcome::Published { discarded, .. }) => assert_eq!(*discarded, count),
        other => panic!("expected a published outcome, got {other:?}"),
    }
}

#[then("the load fails")]
fn then_fails(#[from(outcome)] outcome: &RefCell<Option<LoadOutcome>>) {
    assert!(matches!(
        outcome.borrow().as_ref(),
        Some(LoadOutcome::Failed(SearchError::Network { .. }))
    ));
}

#[then("the snapshot was taken at zoom {zoom}")]
fn then_zoom(#[from(world)] world: &LayerWorld, zoom: u8) {
    assert_eq!(world.layer.snapshot().zoom(), Some(zoom));
}

#[then("every overlay was notified once at zoom {zoom} with the snapshot features")]
fn then_notified(
    #[from(world)] world: &LayerWorld,
    #[from(overlays)] overlays: &RefCell<Vec<Arc<RecordingOverlay>>>,
    zoom: u8,
) {
    let snapshot = world.layer.snapshot();
    let overlays = overlays.borrow();
    assert!(!overlays.is_empty());
    for overlay in overlays.iter() {
        let calls = overlay.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_slice(), snapshot.features());
        assert_eq!(calls[0].1, zoom);
    }
}

#[then("the load is skipped")]
fn then_skipped(#[from(outcome)] outcome: &RefCell<Option<LoadOutcome>>) {
    assert_eq!(outcome.borrow().as_ref(), Some(&LoadOutcome::Skipped));
}

#[then("the search service was not called")]
fn then_not_called(#[from(world)] world: &LayerWorld) {
    assert_eq!(world.search.calls(), 0);
}

#[then("the snapshot is empty")]
fn then_empty(#[from(world)] world: &LayerWorld) {
    assert!(world.layer.snapshot().is_empty());
}

#[scenario(path = "tests/features/viewport_loading.feature", index = 0)]
fn discards_features_outside_viewport(
    world: LayerWorld,
    outcome: RefCell<Option<LoadOutcome>>,
    overlays: RefCell<Vec<Arc<RecordingOverlay>>>,
) {
    let _ = (world, outcome, overlays);
}

#[scenario(path = "tests/features/viewport_loading.feature", index = 1)]
fn failure_keeps_previous_snapshot(
    world: LayerWorld,
    outcome: RefCell<Option<LoadOutcome>>,
    overlays: RefCell<Vec<Arc<RecordingOverlay>>>,
) {
    let _ = (world, outcome, overlays);
}

#[scenario(path = "tests/features/viewport_loading.feature", index = 2)]
fn overlays_notified_once(
    world: LayerWorld,
    outcome: RefCell<Option<LoadOutcome>>,
    overlays: RefCell<Vec<Arc<RecordingOverlay>>>,
) {
    let _ = (world, outcome, overlays);
}

#[scenario(path = "tests/features/viewport_loading.feature", index = 3)]
fn low_zoom_skips_search(
    world: LayerWorld,
    outcome: RefCell<Option<LoadOutcome>>,
    overlays: RefCell<Vec<Arc<RecordingOverlay>>>,
) {
    let _ = (world, outcome, overlays);
}
