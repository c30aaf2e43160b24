//! Command-line interface for building and querying radlnavi geo stores.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};

mod analyse;
mod error;
mod ingest;
mod output;
mod route;

pub use error::CliError;

use analyse::AnalyseArgs;
use ingest::IngestArgs;
use route::{DefaultRouteProviderBuilder, RouteArgs};

const ARG_OSM_PBF: &str = "osm-pbf";
const ARG_OUTPUT: &str = "output";
const ARG_NODE_BATCH_SIZE: &str = "node-batch-size";
const ARG_WAY_BATCH_SIZE: &str = "way-batch-size";
const ENV_OSM_PBF: &str = "RADLNAVI_CMDS_INGEST_OSM_PBF";
const ENV_OUTPUT: &str = "RADLNAVI_CMDS_INGEST_OUTPUT";

const ARG_ANALYSE_REQUEST: &str = "request";
const ARG_STORE: &str = "store";
const ARG_IN_MEMORY: &str = "in-memory";
const ENV_ANALYSE_REQUEST: &str = "RADLNAVI_CMDS_ANALYSE_REQUEST_PATH";
const ENV_ANALYSE_STORE: &str = "RADLNAVI_CMDS_ANALYSE_STORE";

const ARG_START_LAT: &str = "start-lat";
const ARG_START_LON: &str = "start-lon";
const ARG_TARGET_LAT: &str = "target-lat";
const ARG_TARGET_LON: &str = "target-lon";
const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
const ARG_TAG_KEY: &str = "tag-key";
const ENV_START_LAT: &str = "RADLNAVI_CMDS_ROUTE_START_LAT";
const ENV_START_LON: &str = "RADLNAVI_CMDS_ROUTE_START_LON";
const ENV_TARGET_LAT: &str = "RADLNAVI_CMDS_ROUTE_TARGET_LAT";
const ENV_TARGET_LON: &str = "RADLNAVI_CMDS_ROUTE_TARGET_LON";
const ENV_ROUTE_STORE: &str = "RADLNAVI_CMDS_ROUTE_STORE";

/// Run the radlnavi CLI with the current process arguments and environment.
///
/// Command output goes to standard output.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli, &mut stdout)
}

fn dispatch(cli: Cli, writer: &mut dyn Write) -> Result<(), CliError> {
    match cli.command {
        Command::Ingest(args) => ingest::run_ingest_with(args, writer).map(|_| ()),
        Command::Analyse(args) => analyse::run_analyse_with(args, writer),
        Command::Route(args) => route::run_route_with(args, &DefaultRouteProviderBuilder, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "radlnavi",
    about = "Build OSM geo stores and analyse bicycle routes against them",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a SQLite geo store from an OSM PBF extract.
    Ingest(IngestArgs),
    /// Compute the tag distribution of a route given as node ids.
    Analyse(AnalyseArgs),
    /// Route between two points with OSRM and analyse the result.
    Route(RouteArgs),
}

/// Require `path` to name an existing regular file.
fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match radlnavi_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests;
