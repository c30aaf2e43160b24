//! Error types emitted by the radlnavi CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use radlnavi_core::GeoStoreError;
use radlnavi_data::OsmIngestError;
use radlnavi_data::routing::ProviderBuildError;
use thiserror::Error;

/// Errors emitted by the radlnavi CLI.
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
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The store destination names an existing directory.
    #[error("output path {path:?} is a directory")]
    OutputPathIsDirectory { path: Utf8PathBuf },
    /// A batch size option was zero.
    #[error("{field} must be at least 1")]
    ZeroBatchSize { field: &'static str },
    /// A coordinate option is not a finite WGS84 degree value in range.
    #[error("{field} value {value} is outside [{min}, {max}]")]
    InvalidCoordinate {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// OSM ingestion failed.
    #[error("failed to ingest OSM data: {0}")]
    OsmIngest(#[from] OsmIngestError),
    /// Opening the geo store failed.
    #[error("failed to open geo store at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: GeoStoreError,
    },
    /// Copying the geo store into memory failed.
    #[error("failed to load geo store at {path:?} into memory: {source}")]
    LoadStore {
        path: Utf8PathBuf,
        #[source]
        source: GeoStoreError,
    },
    /// A store lookup failed while analysing a route.
    #[error("route analysis failed: {0}")]
    Analyse(#[source] GeoStoreError),
    /// Opening the analysis request file failed.
    #[error("failed to open analysis request at {path:?}: {source}")]
    OpenRequest {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Analysis request JSON could not be decoded.
    #[error("failed to parse analysis request JSON at {path:?}: {source}")]
    ParseRequest {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Constructing the OSRM route provider failed.
    #[error("failed to build route provider for {base_url:?}: {source}")]
    BuildRouteProvider {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// Serializing a command response failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
