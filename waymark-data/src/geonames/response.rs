//! GeoNames `searchJSON` response types.
//!
//! A successful search returns the matching toponyms in a `geonames` array.
//! Failures such as an unknown account or an exhausted credit allowance are
//! reported with HTTP 200 and a `status` object instead.
//!
//! See: <https://www.geonames.org/export/geonames-search.html>

use serde::Deserialize;

/// Top-level `searchJSON` document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Total number of matches on the server, ignoring `maxRows`.
    #[serde(default)]
    pub total_results_count: Option<u64>,

    /// Matching toponyms. Absent when the service reports an error.
    #[serde(default)]
    pub geonames: Option<Vec<Toponym>>,

    /// Application-level failure.
    #[serde(default)]
    pub status: Option<ServiceStatus>,
}

/// Error payload carried in a `status` object.
#[derive(Debug, Deserialize)]
pub struct ServiceStatus {
    /// Human-readable failure description.
    pub message: String,
    /// Numeric GeoNames error code, for example `10` for an unknown user.
    pub value: i64,
}

/// One search hit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toponym {
    /// GeoNames id.
    pub geoname_id: u64,
    /// Place name.
    pub name: String,
    /// Country the place lies in.
    #[serde(default)]
    pub country_name: Option<String>,
    /// Feature-type code such as `PPLC`.
    #[serde(default)]
    pub fcode: Option<String>,
    /// Long form of `fcode`.
    #[serde(default)]
    pub fcode_name: Option<String>,
    /// Inhabitants; `0` means unknown.
    #[serde(default)]
    pub population: Option<u64>,
    /// Latitude in degrees.
    #[serde(default)]
    pub lat: Option<Degrees>,
    /// Longitude in degrees.
    #[serde(default)]
    pub lng: Option<Degrees>,
}

/// A coordinate component. GeoNames usually sends these as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Degrees {
    /// A JSON number.
    Number(f64),
    /// A decimal string such as `"59.43696"`.
    Text(String),
}

impl Degrees {
    /// The finite value in degrees, if the component parses as one.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl SearchResponse {
    /// Whether the server holds more matches than it returned.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        let returned = self.geonames.as_ref().map_or(0, Vec::len);
        self.total_results_count
            .is_some_and(|total| u64::try_from(returned).is_ok_and(|returned| total > returned))
    }
}

impl Toponym {
    /// Longitude and latitude, if both are present and valid.
    #[must_use]
    pub fn lng_lat(&self) -> Option<(f64, f64)> {
        let lng = self.lng.as_ref()?.value()?;
        let lat = self.lat.as_ref()?.value()?;
        ((-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat)).then_some((lng, lat))
    }
}
