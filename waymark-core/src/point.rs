use geo::{Coord, Intersects, Rect};

use crate::{FeatureId, LabelStyle, PointStyle, Projection, RemoteFeature, StyleSet};

/// Title and secondary text attached to a rendered point.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waymark_core::{Label, RemoteFeature};
///
/// let feature = RemoteFeature::new(1, "Tartu", Coord { x: 26.7, y: 58.4 })
///     .with_region("Estonia")
///     .with_feature_code("PPLA", "seat of a first-order administrative division");
/// let label = Label::for_feature(&feature, None);
///
/// assert_eq!(label.title, "Tartu");
/// assert_eq!(
///     label.description,
///     "Estonia type:seat of a first-order administrative division"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Label {
    /// Primary text, the feature name.
    pub title: String,
    /// Region and feature type, space separated.
    pub description: String,
    /// Text style, if the layer has one.
    pub style: Option<LabelStyle>,
}

impl Label {
    /// Combine the feature's name with its region and type description.
    pub fn for_feature(feature: &RemoteFeature, style: Option<LabelStyle>) -> Self {
        let region = feature.region.as_deref().filter(|r| !r.is_empty());
        let kind = feature.type_description().map(|kind| format!("type:{kind}"));
        let description = region
            .into_iter()
            .map(str::to_owned)
            .chain(kind)
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            title: feature.name.clone(),
            description,
            style,
        }
    }
}

/// A feature placed in projection space, ready to hand to a renderer.
///
/// Points are built once per load cycle and never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderablePoint {
    /// Id of the source feature.
    pub feature_id: FeatureId,
    /// Position in the layer's projection space.
    pub position: Coord<f64>,
    /// Text shown next to the point.
    pub label: Label,
    /// Style selected for the zoom level of the cycle that built the point.
    pub style: Option<PointStyle>,
}

impl RenderablePoint {
    /// Project `feature` and attach its label. No style is selected yet.
    pub fn project(
        feature: &RemoteFeature,
        projection: &dyn Projection,
        label_style: Option<&LabelStyle>,
    ) -> Self {
        Self {
            feature_id: feature.id,
            position: projection.from_wgs84(feature.location),
            label: Label::for_feature(feature, label_style.cloned()),
            style: None,
        }
    }

    /// Spatial envelope of the point in projection space.
    pub fn envelope(&self) -> Rect<f64> {
        Rect::new(self.position, self.position)
    }

    /// Whether the point lies inside (or on the edge of) `envelope`.
    ///
    /// Non-finite positions never intersect.
    pub fn intersects(&self, envelope: &Rect<f64>) -> bool {
        self.position.x.is_finite()
            && self.position.y.is_finite()
            && envelope.intersects(&self.envelope())
    }

    /// Select the active style for `zoom`.
    pub fn set_active_style(&mut self, styles: &StyleSet<PointStyle>, zoom: u8) {
        self.style = styles.style_for_zoom(zoom).cloned();
    }
}
