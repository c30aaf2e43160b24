//! Route command implementation for the radlnavi CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use radlnavi_core::{RouteAnalyser, RouteProvider, RouteRequest, RouteResponse};
use radlnavi_data::routing::{HttpRouteProvider, HttpRouteProviderConfig};
use serde::{Deserialize, Serialize};

use crate::analyse::open_store;
use crate::output::write_json_response;
use crate::{
    ARG_OSRM_BASE_URL, ARG_START_LAT, ARG_START_LON, ARG_STORE, ARG_TAG_KEY, ARG_TARGET_LAT,
    ARG_TARGET_LON, CliError, ENV_ROUTE_STORE, ENV_START_LAT, ENV_START_LON, ENV_TARGET_LAT,
    ENV_TARGET_LON, require_existing,
};

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Ask an OSRM instance for a bicycle route between two \
                 WGS84 points and analyse the node ids of its first leg \
                 against a geo store. Prints {\"ok\": false} when no route \
                 could be obtained.",
    about = "Route between two points and analyse the result"
)]
#[ortho_config(prefix = "RADLNAVI")]
pub(crate) struct RouteArgs {
    /// Latitude of the start point in degrees.
    #[arg(long = ARG_START_LAT, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) start_lat: Option<f64>,
    /// Longitude of the start point in degrees.
    #[arg(long = ARG_START_LON, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) start_lon: Option<f64>,
    /// Latitude of the target point in degrees.
    #[arg(long = ARG_TARGET_LAT, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) target_lat: Option<f64>,
    /// Longitude of the target point in degrees.
    #[arg(long = ARG_TARGET_LON, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) target_lon: Option<f64>,
    /// Path to the SQLite geo store built by `radlnavi ingest`.
    #[arg(long = ARG_STORE, value_name = "path")]
    #[serde(default)]
    pub(crate) store: Option<Utf8PathBuf>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Tag key to analyse; repeat for several. Defaults to
    /// `class:bicycle`, `lit` and `surface`.
    #[arg(long = ARG_TAG_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) tag_keys: Vec<String>,
}

impl RouteArgs {
    pub(crate) fn into_config(self) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::try_from(merged)
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteConfig {
    /// `x = longitude`, `y = latitude`.
    pub(crate) start: Coord<f64>,
    /// `x = longitude`, `y = latitude`.
    pub(crate) target: Coord<f64>,
    pub(crate) store: Utf8PathBuf,
    pub(crate) osrm_base_url: String,
    pub(crate) tag_keys: Vec<String>,
}

impl RouteConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.store, ARG_STORE)
    }

    fn request(&self) -> RouteRequest {
        RouteRequest::new(self.start, self.target).with_tag_keys(self.tag_keys.iter().cloned())
    }
}

impl TryFrom<RouteArgs> for RouteConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let start = Coord {
            x: longitude(args.start_lon, ARG_START_LON, ENV_START_LON)?,
            y: latitude(args.start_lat, ARG_START_LAT, ENV_START_LAT)?,
        };
        let target = Coord {
            x: longitude(args.target_lon, ARG_TARGET_LON, ENV_TARGET_LON)?,
            y: latitude(args.target_lat, ARG_TARGET_LAT, ENV_TARGET_LAT)?,
        };
        let store = args.store.ok_or(CliError::MissingArgument {
            field: ARG_STORE,
            env: ENV_ROUTE_STORE,
        })?;

        let default_base_url = HttpRouteProviderConfig::default().base_url;
        let osrm_base_url = args.osrm_base_url.unwrap_or(default_base_url);

        Ok(Self {
            start,
            target,
            store,
            osrm_base_url,
            tag_keys: args.tag_keys,
        })
    }
}

fn latitude(value: Option<f64>, field: &'static str, env: &'static str) -> Result<f64, CliError> {
    in_range(value, field, env, 90.0)
}

fn longitude(value: Option<f64>, field: &'static str, env: &'static str) -> Result<f64, CliError> {
    in_range(value, field, env, 180.0)
}

fn in_range(
    value: Option<f64>,
    field: &'static str,
    env: &'static str,
    limit: f64,
) -> Result<f64, CliError> {
    let degrees = value.ok_or(CliError::MissingArgument { field, env })?;
    if degrees.is_finite() && (-limit..=limit).contains(&degrees) {
        Ok(degrees)
    } else {
        Err(CliError::InvalidCoordinate {
            field,
            value: degrees,
            min: -limit,
            max: limit,
        })
    }
}

/// Builds the route provider for the current route invocation.
pub(crate) trait RouteProviderBuilder {
    fn build(&self, config: &RouteConfig) -> Result<Box<dyn RouteProvider>, CliError>;
}

pub(crate) struct DefaultRouteProviderBuilder;

impl RouteProviderBuilder for DefaultRouteProviderBuilder {
    fn build(&self, config: &RouteConfig) -> Result<Box<dyn RouteProvider>, CliError> {
        let provider = HttpRouteProvider::new(config.osrm_base_url.clone()).map_err(|source| {
            CliError::BuildRouteProvider {
                base_url: config.osrm_base_url.clone(),
                source,
            }
        })?;
        Ok(Box::new(provider))
    }
}

pub(crate) fn run_route_with(
    args: RouteArgs,
    builder: &dyn RouteProviderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let response = execute_route(args, builder)?;
    write_json_response(writer, &response)
}

fn execute_route(
    args: RouteArgs,
    builder: &dyn RouteProviderBuilder,
) -> Result<RouteResponse, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let store = open_store(&config.store, false)?;
    let provider = builder.build(&config)?;
    let analyser = RouteAnalyser::new(store.as_ref());
    analyser
        .route(provider.as_ref(), &config.request())
        .map_err(CliError::Analyse)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RouteConfig, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RouteConfig::try_from(merged)
}
