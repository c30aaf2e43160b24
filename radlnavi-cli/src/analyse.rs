//! Analyse command implementation for the radlnavi CLI.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use radlnavi_core::{
    GeoStore, RouteAnalyser, SqliteGeoStore, TagDistributionRequest, TagDistributionResponse,
};
use radlnavi_fs::open_utf8_file;
use serde::{Deserialize, Serialize};

use crate::output::write_json_response;
use crate::{
    ARG_ANALYSE_REQUEST, ARG_IN_MEMORY, ARG_STORE, CliError, ENV_ANALYSE_REQUEST,
    ENV_ANALYSE_STORE, require_existing,
};

/// CLI arguments for the `analyse` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Reconstruct the ways a route travelled and bucket them by \
                 tag value. The route is provided as a JSON-encoded \
                 TagDistributionRequest listing OSM node ids in travel \
                 order, optionally with the tag keys to analyse.",
    about = "Analyse the tag distribution of a route"
)]
#[ortho_config(prefix = "RADLNAVI")]
pub(crate) struct AnalyseArgs {
    /// Path to a JSON file containing a TagDistributionRequest.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Path to the SQLite geo store built by `radlnavi ingest`.
    #[arg(long = ARG_STORE, value_name = "path")]
    #[serde(default)]
    pub(crate) store: Option<Utf8PathBuf>,
    /// Copy the store into memory before answering.
    #[arg(
        long = ARG_IN_MEMORY,
        value_name = "bool",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) in_memory: Option<bool>,
}

impl AnalyseArgs {
    pub(crate) fn into_config(self) -> Result<AnalyseConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AnalyseConfig::try_from(merged)
    }
}

/// Resolved `analyse` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnalyseConfig {
    pub(crate) request_path: Utf8PathBuf,
    pub(crate) store: Utf8PathBuf,
    pub(crate) in_memory: bool,
}

impl AnalyseConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.request_path, ARG_ANALYSE_REQUEST)?;
        require_existing(&self.store, ARG_STORE)?;
        Ok(())
    }
}

impl TryFrom<AnalyseArgs> for AnalyseConfig {
    type Error = CliError;

    fn try_from(args: AnalyseArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_ANALYSE_REQUEST,
            env: ENV_ANALYSE_REQUEST,
        })?;
        let store = args.store.ok_or(CliError::MissingArgument {
            field: ARG_STORE,
            env: ENV_ANALYSE_STORE,
        })?;
        Ok(Self {
            request_path,
            store,
            in_memory: args.in_memory.unwrap_or(false),
        })
    }
}

/// Open the store at `path`, optionally copying it into memory.
pub(crate) fn open_store(path: &Utf8Path, in_memory: bool) -> Result<Box<dyn GeoStore>, CliError> {
    let store = SqliteGeoStore::open(path).map_err(|source| CliError::OpenStore {
        path: path.to_path_buf(),
        source,
    })?;
    if !in_memory {
        return Ok(Box::new(store));
    }
    let memory = store
        .load_into_memory()
        .map_err(|source| CliError::LoadStore {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Box::new(memory))
}

pub(crate) fn run_analyse_with(args: AnalyseArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let response = execute_analyse(args)?;
    write_json_response(writer, &response)
}

fn execute_analyse(args: AnalyseArgs) -> Result<TagDistributionResponse, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let request = load_analysis_request(&config.request_path)?;
    let store = open_store(&config.store, config.in_memory)?;
    let analyser = RouteAnalyser::new(store.as_ref());
    analyser
        .tag_distribution(&request)
        .map_err(CliError::Analyse)
}

/// Loads a JSON-encoded [`TagDistributionRequest`] from disk.
pub(crate) fn load_analysis_request(path: &Utf8Path) -> Result<TagDistributionRequest, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenRequest {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseRequest {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<AnalyseConfig, CliError> {
    let merged = AnalyseArgs::merge_from_layers(layers).map_err(CliError::from)?;
    AnalyseConfig::try_from(merged)
}
