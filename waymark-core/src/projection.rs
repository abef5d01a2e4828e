//! Transforms between WGS84 and a layer's projection space.
//!
//! A [`Projection`] pairs a forward transform (`from_wgs84`) with its inverse
//! (`to_wgs84`). The loader uses the inverse to turn a viewport envelope into
//! a geographic bounding box and the forward transform to place each returned
//! feature on the map.

use std::f64::consts::{FRAC_PI_2, PI};

use geo::{Coord, Rect};

/// Forward and inverse transforms between WGS84 and projection space.
///
/// Geographic coordinates use `x = longitude`, `y = latitude` in degrees.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waymark_core::{Projection, WebMercator};
///
/// let projection = WebMercator;
/// let projected = projection.from_wgs84(Coord { x: 24.0, y: 58.0 });
/// let back = projection.to_wgs84(projected);
/// assert!((back.x - 24.0).abs() < 1e-9);
/// assert!((back.y - 58.0).abs() < 1e-9);
/// ```
pub trait Projection: Send + Sync {
    /// Convert a WGS84 position into projection space.
    fn from_wgs84(&self, position: Coord<f64>) -> Coord<f64>;

    /// Convert a projection-space position back to WGS84.
    fn to_wgs84(&self, position: Coord<f64>) -> Coord<f64>;

    /// Extent of the projection space.
    fn bounds(&self) -> Rect<f64>;
}

/// Spherical radius used by EPSG:3857, in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which spherical mercator becomes a square world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Spherical (web) mercator, EPSG:3857.
///
/// Latitudes beyond [`MAX_LATITUDE`] are clamped before projecting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn from_wgs84(&self, position: Coord<f64>) -> Coord<f64> {
        let lat = position.y.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        Coord {
            x: EARTH_RADIUS * position.x.to_radians(),
            y: EARTH_RADIUS * (FRAC_PI_2 / 2.0 + lat.to_radians() / 2.0).tan().ln(),
        }
    }

    fn to_wgs84(&self, position: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (position.x / EARTH_RADIUS).to_degrees(),
            y: (2.0 * (position.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees(),
        }
    }

    fn bounds(&self) -> Rect<f64> {
        let half = EARTH_RADIUS * PI;
        Rect::new(Coord { x: -half, y: -half }, Coord { x: half, y: half })
    }
}

/// Plain longitude/latitude, EPSG:4326. Both transforms are the identity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Wgs84;

impl Projection for Wgs84 {
    fn from_wgs84(&self, position: Coord<f64>) -> Coord<f64> {
        position
    }

    fn to_wgs84(&self, position: Coord<f64>) -> Coord<f64> {
        position
    }

    fn bounds(&self) -> Rect<f64> {
        Rect::new(Coord { x: -180.0, y: -90.0 }, Coord { x: 180.0, y: 90.0 })
    }
}
