use std::time::Duration;

use crate::{DEFAULT_MAX_ROWS, LabelStyle, PointStyle, StyleSet};

/// Upper bound on a single load cycle's remote call.
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`FeatureLayer`](crate::FeatureLayer).
///
/// The point style set also decides the layer's minimum zoom: the smallest
/// zoom with a style. A layer without point styles never loads.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use waymark_core::{LayerConfig, PointStyle, StyleSet};
///
/// let config = LayerConfig::new(StyleSet::new().with_style(5, PointStyle::new(6.0, 0xff00_00ff)))
///     .with_max_rows(50)
///     .with_query("church")
///     .with_timeout(Duration::from_secs(2));
///
/// assert_eq!(config.min_zoom(), Some(5));
/// assert_eq!(config.max_rows, 50);
/// ```
#[derive(Debug, Clone)]
pub struct LayerConfig {
    /// Point styles keyed by their first zoom level.
    pub point_styles: StyleSet<PointStyle>,
    /// Style applied to every point label.
    pub label_style: Option<LabelStyle>,
    /// Result cap passed to the search service.
    pub max_rows: u32,
    /// Optional free-text filter added to every search.
    pub query: Option<String>,
    /// Preferred language for feature names.
    pub language: Option<String>,
    /// Time allowed for the remote call of one cycle.
    pub timeout: Duration,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            point_styles: StyleSet::new(),
            label_style: None,
            max_rows: DEFAULT_MAX_ROWS,
            query: None,
            language: None,
            timeout: DEFAULT_CYCLE_TIMEOUT,
        }
    }
}

impl LayerConfig {
    /// Configuration rendering points with `point_styles`.
    #[must_use]
    pub fn new(point_styles: StyleSet<PointStyle>) -> Self {
        Self {
            point_styles,
            ..Default::default()
        }
    }

    /// Attach `style` to every point label.
    #[must_use]
    pub fn with_label_style(mut self, style: LabelStyle) -> Self {
        self.label_style = Some(style);
        self
    }

    /// Set the result cap.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Restrict searches with a free-text query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Request names in `language`.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the per-cycle timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Smallest zoom at which the layer loads anything.
    pub fn min_zoom(&self) -> Option<u8> {
        self.point_styles.first_zoom()
    }
}
