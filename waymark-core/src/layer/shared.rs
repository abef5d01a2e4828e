//! State shared between a layer and the cycles running on its behalf.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use geo::Rect;
use log::{debug, error};
use tokio::sync::Mutex;

use crate::{
    BoundingBox, FeatureOverlay, FeatureSearch, Projection, RemoteFeature, RenderablePoint,
    SearchCriteria, SearchError, VisibleSnapshot,
};

use super::{LayerConfig, LoadOutcome, LoadTask};

pub(super) struct LayerShared {
    pub(super) search: Arc<dyn FeatureSearch>,
    pub(super) projection: Arc<dyn Projection>,
    pub(super) config: LayerConfig,
    pub(super) snapshot: ArcSwap<VisibleSnapshot>,
    pub(super) overlays: ArcSwap<Vec<Arc<dyn FeatureOverlay>>>,
    /// Held for the whole of a cycle so cycles of one layer never overlap.
    cycle_gate: Mutex<()>,
    last_generation: AtomicU64,
}

impl LayerShared {
    pub(super) fn new(
        search: Arc<dyn FeatureSearch>,
        projection: Arc<dyn Projection>,
        config: LayerConfig,
    ) -> Self {
        Self {
            search,
            projection,
            config,
            snapshot: ArcSwap::from_pointee(VisibleSnapshot::empty()),
            overlays: ArcSwap::from_pointee(Vec::new()),
            cycle_gate: Mutex::new(()),
            last_generation: AtomicU64::new(0),
        }
    }

    pub(super) fn next_task(&self, envelope: Rect<f64>, zoom: u8) -> LoadTask {
        let generation = self.last_generation.fetch_add(1, Ordering::AcqRel) + 1;
        LoadTask::new(envelope, zoom, generation)
    }

    pub(super) fn last_generation(&self) -> u64 {
        self.last_generation.load(Ordering::Acquire)
    }

    /// Fetch, convert, filter, publish and notify for one viewport request.
    pub(super) async fn run_cycle(&self, task: LoadTask) -> LoadOutcome {
        let _gate = tokio::select! {
            biased;
            () = task.token().cancelled() => {
                debug!("load {} cancelled while queued", task.generation());
                return LoadOutcome::Cancelled;
            }
            gate = self.cycle_gate.lock() => gate,
        };

        let bbox = BoundingBox::from_envelope(&task.envelope(), self.projection.as_ref());
        debug!("load {} bbox = {bbox} zoom = {}", task.generation(), task.zoom());
        let criteria = self.criteria(bbox);

        let features = match self.fetch(&task, &criteria).await {
            Some(Ok(features)) => features,
            Some(Err(err)) => {
                error!("search for bbox {bbox} failed: {err}");
                return LoadOutcome::Failed(err);
            }
            None => {
                debug!("load {} cancelled during search", task.generation());
                return LoadOutcome::Cancelled;
            }
        };

        let returned = features.len();
        let snapshot = Arc::new(self.build_snapshot(&task, features));
        let accepted = snapshot.len();
        if !self.publish(&snapshot) {
            debug!(
                "load {} superseded by a newer snapshot; result dropped",
                task.generation()
            );
            return LoadOutcome::Superseded {
                generation: task.generation(),
            };
        }
        self.notify(&snapshot);

        LoadOutcome::Published {
            generation: task.generation(),
            accepted,
            discarded: returned - accepted,
        }
    }

    fn criteria(&self, bbox: BoundingBox) -> SearchCriteria {
        let mut criteria = SearchCriteria::new(bbox).with_max_rows(self.config.max_rows);
        criteria.query.clone_from(&self.config.query);
        criteria.language.clone_from(&self.config.language);
        criteria
    }

    /// Run the search under the cycle timeout. `None` means cancelled.
    async fn fetch(
        &self,
        task: &LoadTask,
        criteria: &SearchCriteria,
    ) -> Option<Result<Vec<RemoteFeature>, SearchError>> {
        let timeout = self.config.timeout;
        tokio::select! {
            biased;
            () = task.token().cancelled() => None,
            result = tokio::time::timeout(timeout, self.search.search(criteria)) => {
                Some(result.unwrap_or_else(|_elapsed| Err(SearchError::Timeout { timeout })))
            }
        }
    }

    fn build_snapshot(&self, task: &LoadTask, features: Vec<RemoteFeature>) -> VisibleSnapshot {
        let envelope = task.envelope();
        let label_style = self.config.label_style.as_ref();
        let accepted = features
            .into_iter()
            .filter_map(|feature| {
                debug!(
                    "{} {}",
                    feature.name,
                    feature.region.as_deref().unwrap_or_default()
                );
                let mut point =
                    RenderablePoint::project(&feature, self.projection.as_ref(), label_style);
                if !point.intersects(&envelope) {
                    debug!("{} ({}) lies outside the requested envelope", feature.name, feature.id);
                    return None;
                }
                point.set_active_style(&self.config.point_styles, task.zoom());
                Some((point, feature))
            })
            .collect();
        VisibleSnapshot::from_accepted(task.generation(), task.zoom(), envelope, accepted)
    }

    /// Swap in `next` unless a newer generation is already visible.
    ///
    /// [`FeatureLayer`](super::FeatureLayer) cancels the older cycle whenever
    /// it issues a newer one, so through the layer this only rejects cycles
    /// that are driven directly with out-of-order tasks.
    fn publish(&self, next: &Arc<VisibleSnapshot>) -> bool {
        let mut current = self.snapshot.load();
        loop {
            if current.generation() > next.generation() {
                return false;
            }
            let previous = self.snapshot.compare_and_swap(&*current, Arc::clone(next));
            if Arc::ptr_eq(&*previous, &*current) {
                return true;
            }
            current = previous;
        }
    }

    fn notify(&self, snapshot: &VisibleSnapshot) {
        let Some(zoom) = snapshot.zoom() else {
            return;
        };
        let overlays = self.overlays.load();
        for overlay in overlays.iter() {
            overlay.recompute(snapshot.features(), zoom);
        }
    }
}
