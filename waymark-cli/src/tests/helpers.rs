//! Test doubles for driving the search command without the network.

use std::sync::Arc;

use waymark_core::FeatureSearch;
use waymark_core::test_support::StubFeatureSearch;

use crate::CliError;
use crate::search::{SearchBuilder, SearchConfig};

/// Hands out the same stub search on every build.
pub(super) struct StubSearchBuilder {
    pub(super) search: Arc<StubFeatureSearch>,
}

impl SearchBuilder for StubSearchBuilder {
    fn build(&self, _config: &SearchConfig) -> Result<Arc<dyn FeatureSearch>, CliError> {
        Ok(Arc::clone(&self.search) as Arc<dyn FeatureSearch>)
    }
}

/// `waymark search` followed by `flags`.
pub(super) fn search_command_line(flags: &[&str]) -> Vec<String> {
    ["waymark", "search"]
        .iter()
        .chain(flags)
        .map(|arg| (*arg).to_owned())
        .collect()
}
