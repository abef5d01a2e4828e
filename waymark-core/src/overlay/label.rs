//! Text overlay that picks which feature names to draw.

use std::cmp::Reverse;
use std::sync::Arc;

use arc_swap::ArcSwap;
use geo::Coord;
use log::debug;

use crate::{FeatureId, FeatureLayer, LabelStyle, RemoteFeature, StyleSet};

use super::FeatureOverlay;

/// A piece of text the overlay wants drawn.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextLabel {
    /// Id of the labelled feature.
    pub feature_id: FeatureId,
    /// Text to draw.
    pub text: String,
    /// WGS84 anchor of the text.
    pub position: Coord<f64>,
    /// Style for the current zoom.
    pub style: Option<LabelStyle>,
}

#[derive(Debug)]
struct LabelView {
    zoom: Option<u8>,
    labels: Arc<[TextLabel]>,
}

/// Derives name labels from the features published by a source layer.
///
/// The most populous features win when more than `max_labels` are visible.
/// Below the first zoom of its style set the overlay shows nothing.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use geo::Coord;
/// use waymark_core::{FeatureOverlay, LabelOverlay, LabelStyle, RemoteFeature, StyleSet};
///
/// let overlay = LabelOverlay::new(StyleSet::new().with_style(8, LabelStyle::new(12.0, 0xff00_0000)), 1);
/// overlay.recompute(
///     &[
///         RemoteFeature::new(1, "Keila", Coord { x: 24.4, y: 59.3 }).with_population(9_000),
///         RemoteFeature::new(2, "Tallinn", Coord { x: 24.7, y: 59.4 }).with_population(430_000),
///     ],
///     10,
/// );
/// let labels = overlay.labels();
/// assert_eq!(labels.len(), 1);
/// assert_eq!(labels[0].text, "Tallinn");
/// ```
#[derive(Debug)]
pub struct LabelOverlay {
    styles: StyleSet<LabelStyle>,
    max_labels: usize,
    view: ArcSwap<LabelView>,
}

impl LabelOverlay {
    /// A detached overlay; see [`LabelOverlay::attach`] to follow a layer.
    pub fn new(styles: StyleSet<LabelStyle>, max_labels: usize) -> Self {
        Self {
            styles,
            max_labels,
            view: ArcSwap::from_pointee(LabelView {
                zoom: None,
                labels: Arc::from(Vec::new()),
            }),
        }
    }

    /// Create an overlay and register it with `layer`.
    pub fn attach(layer: &FeatureLayer, styles: StyleSet<LabelStyle>, max_labels: usize) -> Arc<Self> {
        let overlay = Arc::new(Self::new(styles, max_labels));
        layer.register_overlay(Arc::clone(&overlay) as Arc<dyn FeatureOverlay>);
        overlay
    }

    /// Labels chosen by the most recent recompute.
    pub fn labels(&self) -> Arc<[TextLabel]> {
        Arc::clone(&self.view.load().labels)
    }

    /// Zoom of the most recent recompute.
    pub fn zoom(&self) -> Option<u8> {
        self.view.load().zoom
    }

    fn select(&self, features: &[RemoteFeature], zoom: u8) -> Vec<TextLabel> {
        let Some(style) = self.styles.style_for_zoom(zoom) else {
            return Vec::new();
        };
        let mut ranked: Vec<&RemoteFeature> = features.iter().collect();
        ranked.sort_by(|a, b| {
            Reverse(a.population.unwrap_or(0))
                .cmp(&Reverse(b.population.unwrap_or(0)))
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked
            .into_iter()
            .take(self.max_labels)
            .map(|feature| TextLabel {
                feature_id: feature.id,
                text: feature.name.clone(),
                position: feature.location,
                style: Some(style.clone()),
            })
            .collect()
    }
}

impl FeatureOverlay for LabelOverlay {
    fn recompute(&self, features: &[RemoteFeature], zoom: u8) {
        let labels = self.select(features, zoom);
        debug!(
            "label overlay keeps {} of {} features at zoom {zoom}",
            labels.len(),
            features.len()
        );
        self.view.store(Arc::new(LabelView {
            zoom: Some(zoom),
            labels: Arc::from(labels),
        }));
    }
}
