//! Units of background work issued by a [`FeatureLayer`](crate::FeatureLayer).

use geo::Rect;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::SearchError;

/// How a load cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A new snapshot was published and overlays were notified.
    Published {
        /// Generation of the published snapshot.
        generation: u64,
        /// Features kept in the snapshot.
        accepted: usize,
        /// Features returned by the search but not published.
        discarded: usize,
    },
    /// A newer cycle had already published; this result was dropped.
    Superseded {
        /// Generation of the dropped cycle.
        generation: u64,
    },
    /// The cycle was cancelled before its search returned.
    Cancelled,
    /// The zoom level was below the layer's minimum; nothing was requested.
    Skipped,
    /// The search failed or timed out; the previous snapshot stays visible.
    Failed(SearchError),
}

impl LoadOutcome {
    /// Whether this cycle replaced the layer's snapshot.
    pub const fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// One viewport request: an envelope, a zoom level and a cancellation flag.
///
/// Cancellation is advisory. It is honoured while the task waits for its
/// turn and while the remote call is in flight; once results have arrived the
/// cycle runs to completion.
#[derive(Debug)]
pub struct LoadTask {
    envelope: Rect<f64>,
    zoom: u8,
    generation: u64,
    token: CancellationToken,
}

impl LoadTask {
    pub(crate) fn new(envelope: Rect<f64>, zoom: u8, generation: u64) -> Self {
        Self {
            envelope,
            zoom,
            generation,
            token: CancellationToken::new(),
        }
    }

    /// Requested envelope in projection space.
    pub const fn envelope(&self) -> Rect<f64> {
        self.envelope
    }

    /// Zoom level of the request.
    pub const fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Position of the task in the layer's request order, starting at 1.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Load tasks can always be cancelled.
    pub const fn is_cancelable(&self) -> bool {
        true
    }

    /// Ask the task to stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) const fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Caller-side handle to a task spawned on the layer's executor.
#[derive(Debug)]
pub struct LoadHandle {
    generation: u64,
    token: CancellationToken,
    join: JoinHandle<LoadOutcome>,
}

impl LoadHandle {
    pub(crate) const fn new(
        generation: u64,
        token: CancellationToken,
        join: JoinHandle<LoadOutcome>,
    ) -> Self {
        Self {
            generation,
            token,
            join,
        }
    }

    /// Generation of the spawned task.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Load tasks can always be cancelled.
    pub const fn is_cancelable(&self) -> bool {
        true
    }

    /// Ask the task to stop. See [`LoadTask`] for the advisory semantics.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the task has ended.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to end.
    ///
    /// # Errors
    ///
    /// Returns the executor's [`JoinError`] if the task panicked or the
    /// runtime shut down before it completed.
    pub async fn join(self) -> Result<LoadOutcome, JoinError> {
        self.join.await
    }
}
