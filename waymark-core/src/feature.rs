use geo::Coord;

/// Stable identifier assigned to a feature by the search service.
pub type FeatureId = u64;

/// A named place returned by a remote search service.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waymark_core::RemoteFeature;
///
/// let feature = RemoteFeature::new(588_409, "Tallinn", Coord { x: 24.75, y: 59.44 })
///     .with_region("Estonia")
///     .with_feature_code("PPLC", "capital of a political entity");
///
/// assert_eq!(feature.id, 588_409);
/// assert_eq!(feature.region.as_deref(), Some("Estonia"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoteFeature {
    /// GeoNames id, unique per feature.
    pub id: FeatureId,
    /// Display name.
    pub name: String,
    /// Secondary attribute shown under the name, usually the country.
    pub region: Option<String>,
    /// Feature-type code such as `PPL` or `MT`.
    pub feature_code: Option<String>,
    /// Human-readable description of [`Self::feature_code`].
    pub feature_code_name: Option<String>,
    /// Inhabitants, when known.
    pub population: Option<u64>,
    /// WGS84 position, `x` = longitude and `y` = latitude.
    pub location: Coord<f64>,
}

impl RemoteFeature {
    /// Construct a feature with only its identity and position set.
    pub fn new(id: FeatureId, name: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            id,
            name: name.into(),
            region: None,
            feature_code: None,
            feature_code_name: None,
            population: None,
            location,
        }
    }

    /// Attach the secondary region attribute.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Attach the feature-type code and its description.
    #[must_use]
    pub fn with_feature_code(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.feature_code = Some(code.into());
        self.feature_code_name = Some(name.into());
        self
    }

    /// Attach a population figure.
    #[must_use]
    pub fn with_population(mut self, population: u64) -> Self {
        self.population = Some(population);
        self
    }

    /// Text describing the feature type, preferring the long form.
    pub fn type_description(&self) -> Option<&str> {
        self.feature_code_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.feature_code.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("PPL"), Some("populated place"), Some("populated place"))]
    #[case(Some("PPL"), Some(""), Some("PPL"))]
    #[case(Some("PPL"), None, Some("PPL"))]
    #[case(None, None, None)]
    fn type_description_prefers_long_form(
        #[case] code: Option<&str>,
        #[case] name: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let mut feature = RemoteFeature::new(1, "Tartu", Coord { x: 26.7, y: 58.4 });
        feature.feature_code = code.map(str::to_owned);
        feature.feature_code_name = name.map(str::to_owned);
        assert_eq!(feature.type_description(), expected);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn feature_serialises_location_as_coord() {
        let feature = RemoteFeature::new(7, "Narva", Coord { x: 28.19, y: 59.38 });
        let json = serde_json::to_value(&feature).expect("serialise feature");
        assert_eq!(json["location"]["x"], 28.19);
        assert_eq!(json["name"], "Narva");
    }
}
