//! Ingest command implementation for the radlnavi CLI.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use radlnavi_data::{IngestOptions, OsmIngestReport, ingest_osm_pbf_with};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_NODE_BATCH_SIZE, ARG_OSM_PBF, ARG_OUTPUT, ARG_WAY_BATCH_SIZE, CliError, ENV_OSM_PBF,
    ENV_OUTPUT, require_existing,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Stream an OSM PBF extract into a SQLite geo store. The \
                 store is written beside the destination and renamed into \
                 place once complete, so a failed run never replaces an \
                 existing store. Paths can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Build a geo store from an OSM PBF extract"
)]
#[ortho_config(prefix = "RADLNAVI")]
pub(crate) struct IngestArgs {
    /// Path to the OpenStreetMap PBF extract.
    #[arg(long = ARG_OSM_PBF, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_pbf: Option<Utf8PathBuf>,
    /// Destination of the SQLite geo store.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Nodes buffered before a batch is committed.
    #[arg(long = ARG_NODE_BATCH_SIZE, value_name = "count")]
    #[serde(default)]
    pub(crate) node_batch_size: Option<usize>,
    /// Ways buffered before a batch is committed.
    #[arg(long = ARG_WAY_BATCH_SIZE, value_name = "count")]
    #[serde(default)]
    pub(crate) way_batch_size: Option<usize>,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    pub(crate) osm_pbf: Utf8PathBuf,
    pub(crate) output: Utf8PathBuf,
    pub(crate) options: IngestOptions,
}

impl IngestConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.osm_pbf, ARG_OSM_PBF)?;
        Self::require_writable_destination(&self.output)
    }

    fn require_writable_destination(path: &Utf8Path) -> Result<(), CliError> {
        match radlnavi_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::OutputPathIsDirectory {
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_OUTPUT,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let osm_pbf = args.osm_pbf.ok_or(CliError::MissingArgument {
            field: ARG_OSM_PBF,
            env: ENV_OSM_PBF,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_OUTPUT,
        })?;

        let mut options = IngestOptions::default();
        if let Some(size) = args.node_batch_size {
            options = options.with_node_batch_size(non_zero(size, ARG_NODE_BATCH_SIZE)?);
        }
        if let Some(size) = args.way_batch_size {
            options = options.with_way_batch_size(non_zero(size, ARG_WAY_BATCH_SIZE)?);
        }

        Ok(Self {
            osm_pbf,
            output,
            options,
        })
    }
}

fn non_zero(size: usize, field: &'static str) -> Result<usize, CliError> {
    if size == 0 {
        Err(CliError::ZeroBatchSize { field })
    } else {
        Ok(size)
    }
}

fn resolve_ingest_config(args: IngestArgs) -> Result<IngestConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

pub(crate) fn run_ingest_with(
    args: IngestArgs,
    writer: &mut dyn Write,
) -> Result<OsmIngestReport, CliError> {
    let config = resolve_ingest_config(args)?;
    info!(
        "ingesting {} into {} ({} nodes / {} ways per batch)",
        config.osm_pbf,
        config.output,
        config.options.node_batch_size(),
        config.options.way_batch_size()
    );
    let report = ingest_osm_pbf_with(config.osm_pbf.as_std_path(), &config.output, config.options)?;
    write_ingest_summary(writer, &config.output, &report)?;
    Ok(report)
}

fn write_ingest_summary(
    writer: &mut dyn Write,
    output: &Utf8Path,
    report: &OsmIngestReport,
) -> Result<(), CliError> {
    let summary = &report.summary;
    writeln!(
        writer,
        "stored {} nodes and {} ways in {output} ({} relations skipped)",
        summary.nodes, summary.ways, summary.relations
    )
    .map_err(CliError::WriteOutput)?;
    writeln!(
        writer,
        "indexed {} node-to-way rows over {} batches",
        report.node_to_way_rows, report.flushes
    )
    .map_err(CliError::WriteOutput)?;
    if let Some(bounds) = summary.bounds {
        writeln!(
            writer,
            "bounds: lon {}..{}, lat {}..{}",
            bounds.min().x,
            bounds.max().x,
            bounds.min().y,
            bounds.max().y
        )
        .map_err(CliError::WriteOutput)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestConfig, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    IngestConfig::try_from(merged)
}
