//! Feature-search trait implemented by remote service adapters.

use async_trait::async_trait;

use crate::{RemoteFeature, SearchCriteria};

use super::error::SearchError;

/// Fetch features matching a set of criteria.
///
/// Implementations perform the one suspending operation of a load cycle. They
/// must be cancel-safe: the layer drops the returned future when a newer
/// viewport request supersedes the cycle or the cycle times out.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use geo::Coord;
/// use waymark_core::{FeatureSearch, RemoteFeature, SearchCriteria, SearchError};
///
/// struct FixedSearch(Vec<RemoteFeature>);
///
/// #[async_trait]
/// impl FeatureSearch for FixedSearch {
///     async fn search(
///         &self,
///         _criteria: &SearchCriteria,
///     ) -> Result<Vec<RemoteFeature>, SearchError> {
///         Ok(self.0.clone())
///     }
/// }
///
/// let search = FixedSearch(vec![RemoteFeature::new(1, "Tallinn", Coord { x: 24.7, y: 59.4 })]);
/// # let _ = search;
/// ```
#[async_trait]
pub trait FeatureSearch: Send + Sync {
    /// Return the features matching `criteria`.
    ///
    /// Results may include features slightly outside the requested box; the
    /// caller filters them after projection.
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<RemoteFeature>, SearchError>;
}
