//! Search command implementation for the Waymark CLI.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use waymark_core::{
    BoundingBox, DEFAULT_CYCLE_TIMEOUT, DEFAULT_MAX_ROWS, FeatureLayer, FeatureSearch,
    LabelOverlay, LabelStyle, LayerConfig, LoadOutcome, PointStyle, Projection, RemoteFeature,
    StyleSet, TextLabel, WebMercator, Wgs84,
};
use waymark_data::geonames::{DEFAULT_BASE_URL, GeoNamesConfig, GeoNamesSearch};

use crate::{
    ARG_BASE_URL, ARG_EAST, ARG_LANGUAGE, ARG_MAX_LABELS, ARG_MAX_ROWS, ARG_MIN_ZOOM, ARG_NORTH,
    ARG_PROJECTION, ARG_QUERY, ARG_SOUTH, ARG_TIMEOUT_SECS, ARG_USERNAME, ARG_WEST, ARG_ZOOM,
    CliError, ENV_EAST, ENV_NORTH, ENV_SOUTH, ENV_USERNAME, ENV_WEST, ENV_ZOOM,
};

pub(crate) const PROJECTION_WEB_MERCATOR: &str = "epsg3857";
pub(crate) const PROJECTION_WGS84: &str = "epsg4326";
pub(crate) const DEFAULT_MAX_LABELS: usize = 20;

const POINT_COLOR: u32 = 0xffd0_3030;
const LABEL_COLOR: u32 = 0xff20_2020;
const LABEL_HALO: u32 = 0xffff_ffff;

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Run a single viewport load cycle against the GeoNames \
                 search service and print the published features and \
                 labels as JSON. Every option can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Load the places visible in a bounding box"
)]
#[ortho_config(prefix = "WAYMARK")]
pub(crate) struct SearchArgs {
    /// Western bound in degrees.
    #[arg(long = ARG_WEST, value_name = "lon", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) west: Option<f64>,
    /// Southern bound in degrees.
    #[arg(long = ARG_SOUTH, value_name = "lat", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) south: Option<f64>,
    /// Eastern bound in degrees.
    #[arg(long = ARG_EAST, value_name = "lon", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) east: Option<f64>,
    /// Northern bound in degrees.
    #[arg(long = ARG_NORTH, value_name = "lat", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) north: Option<f64>,
    /// Map zoom level of the viewport.
    #[arg(long = ARG_ZOOM, value_name = "level")]
    #[serde(default)]
    pub(crate) zoom: Option<u8>,
    /// GeoNames account name.
    #[arg(long = ARG_USERNAME, value_name = "name")]
    #[serde(default)]
    pub(crate) username: Option<String>,
    /// Free-text filter, e.g. "castle".
    #[arg(long = ARG_QUERY, value_name = "text")]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// Result cap passed to the service (1-1000).
    #[arg(long = ARG_MAX_ROWS, value_name = "rows")]
    #[serde(default)]
    pub(crate) max_rows: Option<u32>,
    /// Language for place names, as an ISO-639 code.
    #[arg(long = ARG_LANGUAGE, value_name = "code")]
    #[serde(default)]
    pub(crate) language: Option<String>,
    /// Root URL of the GeoNames service.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Seconds allowed for the remote call.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Map projection of the layer: epsg3857 or epsg4326.
    #[arg(long = ARG_PROJECTION, value_name = "code")]
    #[serde(default)]
    pub(crate) projection: Option<String>,
    /// Smallest zoom at which the layer loads.
    #[arg(long = ARG_MIN_ZOOM, value_name = "level")]
    #[serde(default)]
    pub(crate) min_zoom: Option<u8>,
    /// Most labels the label overlay keeps.
    #[arg(long = ARG_MAX_LABELS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_labels: Option<usize>,
}

impl SearchArgs {
    pub(crate) fn into_config(self) -> Result<SearchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SearchConfig::try_from(merged)
    }
}

/// Supported layer projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProjectionKind {
    WebMercator,
    Wgs84,
}

impl ProjectionKind {
    fn parse(value: &str) -> Result<Self, CliError> {
        match value.trim().to_ascii_lowercase().as_str() {
            PROJECTION_WEB_MERCATOR => Ok(Self::WebMercator),
            PROJECTION_WGS84 => Ok(Self::Wgs84),
            _ => Err(CliError::InvalidValue {
                field: ARG_PROJECTION,
                value: value.to_owned(),
                expected: "epsg3857 or epsg4326",
            }),
        }
    }

    fn projection(self) -> Arc<dyn Projection> {
        match self {
            Self::WebMercator => Arc::new(WebMercator),
            Self::Wgs84 => Arc::new(Wgs84),
        }
    }
}

/// Resolved `search` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchConfig {
    pub(crate) bbox: BoundingBox,
    pub(crate) zoom: u8,
    pub(crate) username: String,
    pub(crate) query: Option<String>,
    pub(crate) max_rows: u32,
    pub(crate) language: Option<String>,
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) projection: ProjectionKind,
    pub(crate) min_zoom: u8,
    pub(crate) max_labels: usize,
}

impl SearchConfig {
    pub(crate) fn validate_bbox(&self) -> Result<(), CliError> {
        let bbox = self.bbox;
        let reason = if !bbox.is_finite() {
            Some("bounds must be finite numbers")
        } else if bbox.west >= bbox.east {
            Some("west must be less than east")
        } else if bbox.south >= bbox.north {
            Some("south must be less than north")
        } else if bbox.west < -180.0 || bbox.east > 180.0 {
            Some("longitudes must lie within -180..=180")
        } else if bbox.south < -90.0 || bbox.north > 90.0 {
            Some("latitudes must lie within -90..=90")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(CliError::InvalidBoundingBox { bbox, reason }),
            None => Ok(()),
        }
    }

    fn layer_config(&self) -> LayerConfig {
        let mut config = LayerConfig::new(
            StyleSet::new().with_style(self.min_zoom, PointStyle::new(8.0, POINT_COLOR)),
        )
        .with_label_style(LabelStyle::new(12.0, LABEL_COLOR))
        .with_max_rows(self.max_rows)
        .with_timeout(self.timeout);
        config.query.clone_from(&self.query);
        config.language.clone_from(&self.language);
        config
    }

    fn label_styles(&self) -> StyleSet<LabelStyle> {
        StyleSet::new().with_style(
            self.min_zoom,
            LabelStyle::new(12.0, LABEL_COLOR).with_halo(LABEL_HALO),
        )
    }
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let west = args.west.ok_or(CliError::MissingArgument {
            field: ARG_WEST,
            env: ENV_WEST,
        })?;
        let south = args.south.ok_or(CliError::MissingArgument {
            field: ARG_SOUTH,
            env: ENV_SOUTH,
        })?;
        let east = args.east.ok_or(CliError::MissingArgument {
            field: ARG_EAST,
            env: ENV_EAST,
        })?;
        let north = args.north.ok_or(CliError::MissingArgument {
            field: ARG_NORTH,
            env: ENV_NORTH,
        })?;
        let zoom = args.zoom.ok_or(CliError::MissingArgument {
            field: ARG_ZOOM,
            env: ENV_ZOOM,
        })?;
        let username = args
            .username
            .filter(|name| !name.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_USERNAME,
                env: ENV_USERNAME,
            })?;
        let projection = args
            .projection
            .as_deref()
            .map_or(Ok(ProjectionKind::WebMercator), ProjectionKind::parse)?;

        Ok(Self {
            bbox: BoundingBox {
                west,
                south,
                east,
                north,
            },
            zoom,
            username,
            query: args.query.filter(|query| !query.is_empty()),
            max_rows: args.max_rows.unwrap_or(DEFAULT_MAX_ROWS),
            language: args.language.filter(|language| !language.is_empty()),
            base_url: args.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            timeout: args
                .timeout_secs
                .map_or(DEFAULT_CYCLE_TIMEOUT, Duration::from_secs),
            projection,
            min_zoom: args.min_zoom.unwrap_or(0),
            max_labels: args.max_labels.unwrap_or(DEFAULT_MAX_LABELS),
        })
    }
}

/// Builds the search backend for the current invocation.
pub(crate) trait SearchBuilder {
    fn build(&self, config: &SearchConfig) -> Result<Arc<dyn FeatureSearch>, CliError>;
}

pub(crate) struct GeoNamesSearchBuilder;

impl SearchBuilder for GeoNamesSearchBuilder {
    fn build(&self, config: &SearchConfig) -> Result<Arc<dyn FeatureSearch>, CliError> {
        let geonames = GeoNamesConfig::new(config.username.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout);
        let search =
            GeoNamesSearch::with_config(geonames).map_err(|source| CliError::BuildSearch {
                base_url: config.base_url.clone(),
                source,
            })?;
        Ok(Arc::new(search))
    }
}

/// JSON document printed by the `search` command.
#[derive(Debug, Serialize)]
pub(crate) struct SearchReport {
    pub(crate) outcome: &'static str,
    pub(crate) zoom: u8,
    pub(crate) bbox: BoundingBox,
    pub(crate) accepted: usize,
    pub(crate) discarded: usize,
    pub(crate) features: Vec<RemoteFeature>,
    pub(crate) labels: Vec<TextLabel>,
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_search_with(args, &GeoNamesSearchBuilder, &mut stdout)
}

pub(crate) fn run_search_with(
    args: SearchArgs,
    builder: &dyn SearchBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_search_config(args)?;
    let report = execute_search(&config, builder)?;
    write_report(writer, &report)
}

fn resolve_search_config(args: SearchArgs) -> Result<SearchConfig, CliError> {
    let config = args.into_config()?;
    config.validate_bbox()?;
    Ok(config)
}

pub(crate) fn execute_search(
    config: &SearchConfig,
    builder: &dyn SearchBuilder,
) -> Result<SearchReport, CliError> {
    let search = builder.build(config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let projection = config.projection.projection();
    let envelope = config.bbox.to_envelope(projection.as_ref());
    let layer = FeatureLayer::new(
        search,
        projection,
        config.layer_config(),
        runtime.handle().clone(),
    );
    let labels = LabelOverlay::attach(&layer, config.label_styles(), config.max_labels);

    let outcome = match layer.calculate_visible_elements(envelope, config.zoom) {
        Some(handle) => runtime.block_on(handle.join()).map_err(CliError::Join)?,
        None => LoadOutcome::Skipped,
    };

    let (outcome, accepted, discarded) = match outcome {
        LoadOutcome::Published {
            accepted,
            discarded,
            ..
        } => ("published", accepted, discarded),
        LoadOutcome::Skipped => ("skipped", 0, 0),
        LoadOutcome::Superseded { .. } => ("superseded", 0, 0),
        LoadOutcome::Cancelled => ("cancelled", 0, 0),
        LoadOutcome::Failed(source) => return Err(CliError::Load { source }),
    };
    info!("{outcome}: {accepted} features kept, {discarded} discarded");

    Ok(SearchReport {
        outcome,
        zoom: config.zoom,
        bbox: config.bbox,
        accepted,
        discarded,
        features: layer.visible_features(),
        labels: labels.labels().to_vec(),
    })
}

fn write_report(writer: &mut dyn Write, report: &SearchReport) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerialiseReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SearchConfig, CliError> {
    let merged = SearchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SearchConfig::try_from(merged)
}
