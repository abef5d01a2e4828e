//! Error types emitted by the Waymark CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use thiserror::Error;
use waymark_core::{BoundingBox, SearchError};
use waymark_data::SearchBuildError;

/// Errors emitted by the Waymark CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A configured value is outside its accepted set.
    #[error("invalid {field} {value:?}: expected {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The bounding box is inverted, non-finite or outside WGS84 bounds.
    #[error("invalid bounding box {bbox}: {reason}")]
    InvalidBoundingBox {
        bbox: BoundingBox,
        reason: &'static str,
    },
    /// Constructing the GeoNames client failed.
    #[error("failed to build GeoNames search for {base_url:?}: {source}")]
    BuildSearch {
        base_url: String,
        #[source]
        source: SearchBuildError,
    },
    /// The Tokio runtime could not be started.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The background load task panicked or was aborted.
    #[error("load task did not complete: {0}")]
    Join(#[source] tokio::task::JoinError),
    /// The search failed; nothing was published.
    #[error("search failed: {source}")]
    Load {
        #[source]
        source: SearchError,
    },
    /// Serialising the report failed.
    #[error("failed to serialise search report: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing the report failed.
    #[error("failed to write search report: {0}")]
    WriteOutput(#[source] std::io::Error),
}
