//! Command-line interface for querying the Waymark feature loader.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod search;

pub use error::CliError;

use search::{SearchArgs, run_search};

const ARG_WEST: &str = "west";
const ARG_SOUTH: &str = "south";
const ARG_EAST: &str = "east";
const ARG_NORTH: &str = "north";
const ARG_ZOOM: &str = "zoom";
const ARG_USERNAME: &str = "username";
const ARG_QUERY: &str = "query";
const ARG_MAX_ROWS: &str = "max-rows";
const ARG_LANGUAGE: &str = "language";
const ARG_BASE_URL: &str = "base-url";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_PROJECTION: &str = "projection";
const ARG_MIN_ZOOM: &str = "min-zoom";
const ARG_MAX_LABELS: &str = "max-labels";
const ENV_WEST: &str = "WAYMARK_CMDS_SEARCH_WEST";
const ENV_SOUTH: &str = "WAYMARK_CMDS_SEARCH_SOUTH";
const ENV_EAST: &str = "WAYMARK_CMDS_SEARCH_EAST";
const ENV_NORTH: &str = "WAYMARK_CMDS_SEARCH_NORTH";
const ENV_ZOOM: &str = "WAYMARK_CMDS_SEARCH_ZOOM";
const ENV_USERNAME: &str = "WAYMARK_CMDS_SEARCH_USERNAME";

/// Run the Waymark CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Search(args) => run_search(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "waymark",
    about = "Load remote place features for a map viewport",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one load cycle for a bounding box and print the snapshot.
    Search(SearchArgs),
}

#[cfg(test)]
mod tests;
