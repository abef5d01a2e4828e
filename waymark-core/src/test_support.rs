//! Deterministic test doubles for the feature search and overlays.
//!
//! [`StubFeatureSearch`] answers from pre-configured responses without any
//! network access. [`RecordingOverlay`] remembers every notification it
//! receives.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use geo::{Coord, Rect};
use tokio::sync::Notify;

use crate::{
    BoundingBox, FeatureOverlay, FeatureSearch, RemoteFeature, SearchCriteria, SearchError,
    WebMercator,
};

#[derive(Debug, Clone)]
enum StubResponse {
    Reply(Result<Vec<RemoteFeature>, SearchError>),
    Hang,
}

/// Stub `FeatureSearch` for tests.
///
/// Queued one-off responses are used first; afterwards every call receives
/// the default response.
///
/// # Example
///
/// ```
/// use geo::Coord;
/// use waymark_core::test_support::StubFeatureSearch;
/// use waymark_core::{BoundingBox, FeatureSearch, RemoteFeature, SearchCriteria};
///
/// let search = StubFeatureSearch::with_features(vec![
///     RemoteFeature::new(1, "Tallinn", Coord { x: 24.7, y: 59.4 }),
/// ]);
/// let bbox = BoundingBox::from_corners(Coord { x: 24.0, y: 59.0 }, Coord { x: 25.0, y: 60.0 });
/// let runtime = tokio::runtime::Builder::new_current_thread().build()?;
/// let found = runtime.block_on(search.search(&SearchCriteria::new(bbox)));
/// assert_eq!(found.map(|f| f.len()), Ok(1));
/// assert_eq!(search.calls(), 1);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct StubFeatureSearch {
    default: StubResponse,
    queued: Mutex<VecDeque<StubResponse>>,
    calls: AtomicUsize,
    last_criteria: Mutex<Option<SearchCriteria>>,
    called: Notify,
}

impl StubFeatureSearch {
    fn with_default(default: StubResponse) -> Self {
        Self {
            default,
            queued: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            last_criteria: Mutex::new(None),
            called: Notify::new(),
        }
    }

    /// Answer every call with `features`.
    #[must_use]
    pub fn with_features(features: Vec<RemoteFeature>) -> Self {
        Self::with_default(StubResponse::Reply(Ok(features)))
    }

    /// Fail every call with `error`.
    #[must_use]
    pub fn with_error(error: SearchError) -> Self {
        Self::with_default(StubResponse::Reply(Err(error)))
    }

    /// Use `response` for the next unanswered call only.
    pub fn respond_next(&self, response: Result<Vec<RemoteFeature>, SearchError>) {
        lock(&self.queued).push_back(StubResponse::Reply(response));
    }

    /// Make the next unanswered call never complete.
    pub fn hang_next(&self) {
        lock(&self.queued).push_back(StubResponse::Hang);
    }

    /// Number of searches started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Criteria of the most recent search.
    pub fn last_criteria(&self) -> Option<SearchCriteria> {
        lock(&self.last_criteria).clone()
    }

    /// Wait until at least `count` searches have started.
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.called.notified();
            if self.calls() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl FeatureSearch for StubFeatureSearch {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<RemoteFeature>, SearchError> {
        *lock(&self.last_criteria) = Some(criteria.clone());
        let response = lock(&self.queued)
            .pop_front()
            .unwrap_or_else(|| self.default.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called.notify_waiters();
        match response {
            StubResponse::Reply(result) => result,
            StubResponse::Hang => std::future::pending().await,
        }
    }
}

/// Overlay that records each `recompute` call.
#[derive(Debug, Default)]
pub struct RecordingOverlay {
    calls: Mutex<Vec<(Vec<RemoteFeature>, u8)>>,
}

impl RecordingOverlay {
    /// Feature lists and zoom levels received, oldest first.
    pub fn calls(&self) -> Vec<(Vec<RemoteFeature>, u8)> {
        lock(&self.calls).clone()
    }
}

impl FeatureOverlay for RecordingOverlay {
    fn recompute(&self, features: &[RemoteFeature], zoom: u8) {
        lock(&self.calls).push((features.to_vec(), zoom));
    }
}

/// Web-mercator envelope of the WGS84 box (24, 58)-(25, 59).
pub fn estonia_envelope() -> Rect<f64> {
    BoundingBox::from_corners(Coord { x: 24.0, y: 58.0 }, Coord { x: 25.0, y: 59.0 })
        .to_envelope(&WebMercator)
}

/// Three search results, the last of which lies east of
/// [`estonia_envelope`].
pub fn estonia_features() -> Vec<RemoteFeature> {
    vec![
        RemoteFeature::new(588_409, "Tallinn", Coord { x: 24.753_5, y: 58.95 })
            .with_region("Estonia")
            .with_feature_code("PPLC", "capital of a political entity")
            .with_population(434_562),
        RemoteFeature::new(590_031, "Haapsalu", Coord { x: 24.536_9, y: 58.943_1 })
            .with_region("Estonia")
            .with_feature_code("PPLA", "seat of a first-order administrative division")
            .with_population(9_375),
        RemoteFeature::new(588_335, "Tartu", Coord { x: 26.722_5, y: 58.38 })
            .with_region("Estonia")
            .with_feature_code("PPLA", "seat of a first-order administrative division")
            .with_population(91_407),
    ]
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
