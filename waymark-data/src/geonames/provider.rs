//! `FeatureSearch` backed by the GeoNames `searchJSON` web service.
//!
//! # Example
//!
//! ```no_run
//! use geo::Coord;
//! use waymark_core::{BoundingBox, FeatureSearch, SearchCriteria};
//! use waymark_data::geonames::{GeoNamesConfig, GeoNamesSearch};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let search = GeoNamesSearch::with_config(GeoNamesConfig::new("demo"))?;
//! let bbox = BoundingBox::from_corners(Coord { x: 24.0, y: 59.0 }, Coord { x: 25.0, y: 60.0 });
//! let features = search.search(&SearchCriteria::new(bbox).with_max_rows(20)).await?;
//! println!("found {} places", features.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;
use log::{debug, warn};
use reqwest::Client;
use thiserror::Error;
use url::Url;
use waymark_core::{FeatureSearch, RemoteFeature, SearchCriteria, SearchError};

use super::response::{SearchResponse, Toponym};

/// Public GeoNames endpoint.
pub const DEFAULT_BASE_URL: &str = "http://api.geonames.org";

/// Default user agent for GeoNames requests.
pub const DEFAULT_USER_AGENT: &str = "waymark-geonames/0.1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Error returned when a [`GeoNamesSearch`] cannot be constructed.
#[derive(Debug, Error)]
pub enum SearchBuildError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// The base URL does not parse or cannot carry a path.
    #[error("invalid GeoNames base URL {url:?}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// GeoNames rejects anonymous requests.
    #[error("a GeoNames username is required")]
    MissingUsername,
}

/// Configuration for [`GeoNamesSearch`].
#[derive(Debug, Clone)]
pub struct GeoNamesConfig {
    /// Service root, for example `"http://api.geonames.org"`.
    pub base_url: String,
    /// Registered GeoNames account name.
    pub username: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for GeoNamesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            username: String::new(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl GeoNamesConfig {
    /// Configuration for the public service using `username`.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// Point the adapter at another service root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request HTTP timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// GeoNames place search.
#[derive(Debug, Clone)]
pub struct GeoNamesSearch {
    client: Client,
    endpoint: Url,
    config: GeoNamesConfig,
}

impl GeoNamesSearch {
    /// Create a search client for the public service.
    ///
    /// # Errors
    ///
    /// See [`GeoNamesSearch::with_config`].
    pub fn new(username: impl Into<String>) -> Result<Self, SearchBuildError> {
        Self::with_config(GeoNamesConfig::new(username))
    }

    /// Create a search client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the username is blank, the base URL is invalid, or
    /// the HTTP client fails to build.
    pub fn with_config(config: GeoNamesConfig) -> Result<Self, SearchBuildError> {
        if config.username.trim().is_empty() {
            return Err(SearchBuildError::MissingUsername);
        }
        let endpoint = endpoint_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SearchBuildError::HttpClient)?;
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Configuration the client was built from.
    pub fn config(&self) -> &GeoNamesConfig {
        &self.config
    }

    /// Build the `searchJSON` URL for `criteria`.
    ///
    /// Parameters are emitted in a fixed order: the four bounds, `maxRows`,
    /// `username`, then the optional `q` and `lang`.
    pub fn build_search_url(&self, criteria: &SearchCriteria) -> Url {
        let mut url = self.endpoint.clone();
        {
            let bbox = &criteria.bbox;
            let mut query = url.query_pairs_mut();
            query
                .append_pair("north", &bbox.north.to_string())
                .append_pair("south", &bbox.south.to_string())
                .append_pair("east", &bbox.east.to_string())
                .append_pair("west", &bbox.west.to_string())
                .append_pair("maxRows", &criteria.max_rows.to_string())
                .append_pair("username", &self.config.username);
            if let Some(q) = criteria.query.as_deref().filter(|q| !q.is_empty()) {
                query.append_pair("q", q);
            }
            if let Some(lang) = criteria.language.as_deref().filter(|l| !l.is_empty()) {
                query.append_pair("lang", lang);
            }
        }
        url
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> SearchError {
        if error.is_timeout() {
            return SearchError::Timeout {
                timeout: self.config.timeout,
            };
        }

        if let Some(status) = error.status() {
            return SearchError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        SearchError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Turn a decoded document into features.
///
/// A `status` object wins over any toponyms. Records without usable
/// coordinates are skipped.
pub(crate) fn convert_response(response: SearchResponse) -> Result<Vec<RemoteFeature>, SearchError> {
    if let Some(status) = response.status {
        return Err(SearchError::Service {
            code: status.value,
            message: status.message,
        });
    }

    if response.is_truncated() {
        debug!(
            "GeoNames holds {:?} matches; only the first page was returned",
            response.total_results_count
        );
    }

    let toponyms = response.geonames.ok_or_else(|| SearchError::Parse {
        message: "GeoNames response missing geonames array".to_owned(),
    })?;

    Ok(toponyms.into_iter().filter_map(to_feature).collect())
}

fn to_feature(toponym: Toponym) -> Option<RemoteFeature> {
    let Some((lng, lat)) = toponym.lng_lat() else {
        warn!(
            "skipping GeoNames record {} ({}): unusable coordinates",
            toponym.geoname_id, toponym.name
        );
        return None;
    };
    let mut feature = RemoteFeature::new(toponym.geoname_id, toponym.name, Coord { x: lng, y: lat });
    feature.region = toponym.country_name.filter(|name| !name.is_empty());
    feature.feature_code = toponym.fcode.filter(|code| !code.is_empty());
    feature.feature_code_name = toponym.fcode_name.filter(|name| !name.is_empty());
    // GeoNames reports 0 when the population is unknown.
    feature.population = toponym.population.filter(|&population| population > 0);
    Some(feature)
}

fn endpoint_url(base_url: &str) -> Result<Url, SearchBuildError> {
    let invalid = |source| SearchBuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        source,
    };
    let base = Url::parse(base_url).map_err(invalid)?;
    if base.cannot_be_a_base() {
        return Err(invalid(url::ParseError::RelativeUrlWithCannotBeABaseBase));
    }
    Url::parse(&format!("{}/searchJSON", base.as_str().trim_end_matches('/'))).map_err(invalid)
}

#[async_trait]
impl FeatureSearch for GeoNamesSearch {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<RemoteFeature>, SearchError> {
        let url = self.build_search_url(criteria);
        debug!("GeoNames search bbox = {}", criteria.bbox);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url.as_str()))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url.as_str()))?;

        let body: SearchResponse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                self.convert_reqwest_error(&err, url.as_str())
            } else {
                SearchError::Parse {
                    message: err.to_string(),
                }
            }
        })?;

        convert_response(body)
    }
}
