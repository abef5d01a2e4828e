//! Geographic bounding boxes and the search criteria built from them.

use std::fmt;

use geo::{Coord, Rect};

use crate::Projection;

/// Number of rows requested when the caller does not choose one.
pub const DEFAULT_MAX_ROWS: u32 = 100;

/// Largest row count the search service will honour.
pub const MAX_ROWS_LIMIT: u32 = 1000;

/// Axis-aligned WGS84 bounds in degrees.
///
/// Constructors normalise the corners so `west <= east` and
/// `south <= north`. Boxes crossing the antimeridian are not modelled.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waymark_core::BoundingBox;
///
/// let bbox = BoundingBox::from_corners(Coord { x: 25.0, y: 59.0 }, Coord { x: 24.0, y: 58.0 });
/// assert_eq!(bbox.west, 24.0);
/// assert_eq!(bbox.north, 59.0);
/// assert_eq!(bbox.to_string(), "24,58,25,59");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    /// Western longitude.
    pub west: f64,
    /// Southern latitude.
    pub south: f64,
    /// Eastern longitude.
    pub east: f64,
    /// Northern latitude.
    pub north: f64,
}

impl BoundingBox {
    /// Build a box from two opposite corners in any order.
    pub fn from_corners(a: Coord<f64>, b: Coord<f64>) -> Self {
        Self {
            west: a.x.min(b.x),
            south: a.y.min(b.y),
            east: a.x.max(b.x),
            north: a.y.max(b.y),
        }
    }

    /// Convert a projection-space envelope into geographic bounds.
    ///
    /// Only the envelope's min and max corners are transformed, matching how
    /// the map view reports its viewport.
    pub fn from_envelope(envelope: &Rect<f64>, projection: &dyn Projection) -> Self {
        let min = projection.to_wgs84(envelope.min());
        let max = projection.to_wgs84(envelope.max());
        Self::from_corners(min, max)
    }

    /// Project the box into an envelope using the forward transform.
    pub fn to_envelope(&self, projection: &dyn Projection) -> Rect<f64> {
        let min = projection.from_wgs84(Coord {
            x: self.west,
            y: self.south,
        });
        let max = projection.from_wgs84(Coord {
            x: self.east,
            y: self.north,
        });
        Rect::new(min, max)
    }

    /// The box as a `geo::Rect` in degrees.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.west,
                y: self.south,
            },
            Coord {
                x: self.east,
                y: self.north,
            },
        )
    }

    /// Whether every bound is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.west, self.south, self.east, self.north]
            .iter()
            .all(|value| value.is_finite())
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

/// Parameters passed to a [`crate::FeatureSearch`] implementation.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waymark_core::{BoundingBox, SearchCriteria, MAX_ROWS_LIMIT};
///
/// let bbox = BoundingBox::from_corners(Coord { x: 24.0, y: 58.0 }, Coord { x: 25.0, y: 59.0 });
/// let criteria = SearchCriteria::new(bbox).with_max_rows(5_000).with_query("museum");
/// assert_eq!(criteria.max_rows, MAX_ROWS_LIMIT);
/// assert_eq!(criteria.query.as_deref(), Some("museum"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    /// Area to search, in WGS84 degrees.
    pub bbox: BoundingBox,
    /// Optional free-text filter.
    pub query: Option<String>,
    /// Result cap, always within `1..=MAX_ROWS_LIMIT`.
    pub max_rows: u32,
    /// Preferred language for names, as an ISO-639 code.
    pub language: Option<String>,
}

impl SearchCriteria {
    /// Criteria for `bbox` with the default row cap and no query.
    pub const fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            query: None,
            max_rows: DEFAULT_MAX_ROWS,
            language: None,
        }
    }

    /// Set the result cap, clamped to `1..=MAX_ROWS_LIMIT`.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows.clamp(1, MAX_ROWS_LIMIT);
        self
    }

    /// Set the free-text query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the response language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}
