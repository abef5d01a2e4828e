//! Components that derive their own view from a layer's published features.
//!
//! An overlay registers with exactly one source [`FeatureLayer`]. After each
//! successful publish the layer calls [`FeatureOverlay::recompute`] with the
//! new feature list, so the overlay never has to query the remote service
//! itself.
//!
//! [`FeatureLayer`]: crate::FeatureLayer

mod label;

pub use label::{LabelOverlay, TextLabel};

use crate::RemoteFeature;

/// Observer notified after a layer publishes a new snapshot.
///
/// Calls may arrive for a viewport that has since been superseded; overlays
/// must treat every call as a full replacement of their previous input.
pub trait FeatureOverlay: Send + Sync {
    /// Recompute the overlay from the source layer's features at `zoom`.
    fn recompute(&self, features: &[RemoteFeature], zoom: u8);
}
