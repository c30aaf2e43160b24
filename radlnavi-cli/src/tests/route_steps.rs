//! Behaviour-driven step definitions driving the route CLI scenarios.

use super::helpers::{Workspace, build_sample_store};
use super::*;
use crate::route::{RouteConfig, RouteProviderBuilder, run_route_with};
use camino::Utf8PathBuf;
use radlnavi_core::{RouteProvider, RoutingError};
use radlnavi_data::routing::test_support::StubRouteProvider;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};

#[derive(Debug)]
struct RouteWorld {
    workspace: Workspace,
    store: Utf8PathBuf,
    start_lat: RefCell<String>,
    provider: RefCell<Option<StubRouteProvider>>,
    builds: Cell<usize>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl RouteWorld {
    fn new() -> Self {
        let workspace = Workspace::new();
        let store = workspace.path("sample.db");
        Self {
            workspace,
            store,
            start_lat: RefCell::new("48.001".to_owned()),
            provider: RefCell::new(None),
            builds: Cell::new(0),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["radlnavi".to_owned(), "route".to_owned()];
        argv.extend([
            format!("--{ARG_START_LAT}"),
            self.start_lat.borrow().clone(),
            format!("--{ARG_START_LON}"),
            "11.0".to_owned(),
            format!("--{ARG_TARGET_LAT}"),
            "48.004".to_owned(),
            format!("--{ARG_TARGET_LON}"),
            "11.0".to_owned(),
            format!("--{ARG_STORE}"),
            self.store.to_string(),
            format!("--{ARG_OSRM_BASE_URL}"),
            "http://osrm.test:5000".to_owned(),
            format!("--{ARG_TAG_KEY}"),
            "surface".to_owned(),
        ]);
        argv
    }

    fn output_json(&self) -> Value {
        let borrowed = self.result.borrow();
        borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect("expected success");
        serde_json::from_slice(&self.stdout.borrow()).expect("output should be JSON")
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> RouteWorld {
    RouteWorld::new()
}

/// Hands out clones of a stub provider and counts how often it was asked.
struct StubRouteProviderBuilder<'a> {
    provider: StubRouteProvider,
    builds: &'a Cell<usize>,
}

impl RouteProviderBuilder for StubRouteProviderBuilder<'_> {
    fn build(&self, config: &RouteConfig) -> Result<Box<dyn RouteProvider>, CliError> {
        assert_eq!(config.osrm_base_url, "http://osrm.test:5000");
        self.builds.set(self.builds.get() + 1);
        Ok(Box::new(self.provider.clone()))
    }
}

#[given("a sample geo store exists on disk")]
fn sample_store_exists(#[from(world)] world: &RouteWorld) {
    build_sample_store(&world.store);
    assert!(world.workspace.root().join("sample.db").is_file());
}

#[given("the routing service returns nodes 1 to 4")]
fn routing_returns_nodes(#[from(world)] world: &RouteWorld) {
    world
        .provider
        .replace(Some(StubRouteProvider::with_nodes(vec![1, 2, 3, 4])));
}

#[given("the routing service is unreachable")]
fn routing_unreachable(#[from(world)] world: &RouteWorld) {
    world
        .provider
        .replace(Some(StubRouteProvider::with_error(RoutingError::NetworkError {
            url: "http://osrm.test:5000/route/v1/bike".to_owned(),
            message: "connection refused".to_owned(),
        })));
}

#[given("the start latitude is beyond the pole")]
fn start_latitude_beyond_pole(#[from(world)] world: &RouteWorld) {
    world.start_lat.replace("95.0".to_owned());
}

#[when("I run the route command")]
fn run_route_command(#[from(world)] world: &RouteWorld) {
    let provider = world
        .provider
        .borrow()
        .clone()
        .expect("routing behaviour configured by an earlier step");
    let builder = StubRouteProviderBuilder {
        provider,
        builds: &world.builds,
    };
    let outcome = Cli::try_parse_from(world.build_command_line())
        .map_err(CliError::from)
        .and_then(|cli| match cli.command {
            Command::Route(args) => {
                let mut buffer = world.stdout.borrow_mut();
                run_route_with(args, &builder, &mut *buffer)
            }
            other => panic!("expected route command, found {other:?}"),
        });
    world.result.replace(Some(outcome));
}

#[then("the command prints the route with its surface distribution")]
fn prints_route(#[from(world)] world: &RouteWorld) {
    let json = world.output_json();
    assert_eq!(json["ok"], Value::Bool(true));
    assert_eq!(json["route"]["annotation"]["nodes"], json!([1, 2, 3, 4]));

    let distribution = json["tag_distribution"]
        .as_object()
        .expect("distribution object");
    assert_eq!(distribution.keys().collect::<Vec<_>>(), vec!["surface"]);
    assert!(distribution["surface"]["asphalt"]["ways"]["10"].is_object());
    assert!(distribution["surface"]["gravel"]["ways"]["11"].is_object());
    assert_eq!(world.builds.get(), 1);
}

#[then("the command prints a not ok response")]
fn prints_not_ok(#[from(world)] world: &RouteWorld) {
    assert_eq!(world.output_json(), json!({ "ok": false }));
}

#[then("the command fails because \"start-lat\" is out of range")]
fn fails_out_of_range(#[from(world)] world: &RouteWorld) {
    match &*world.error() {
        CliError::InvalidCoordinate { field, value, .. } => {
            assert_eq!(*field, ARG_START_LAT);
            assert_eq!(*value, 95.0);
        }
        other => panic!("expected InvalidCoordinate, found {other:?}"),
    }
}

#[then("the command fails because the store path is missing")]
fn fails_missing_store(#[from(world)] world: &RouteWorld) {
    match &*world.error() {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(*field, ARG_STORE);
            assert_eq!(path, &world.store);
        }
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[then("no route was requested")]
fn no_route_requested(#[from(world)] world: &RouteWorld) {
    assert_eq!(world.builds.get(), 0);
    assert!(world.stdout.borrow().is_empty());
}

macro_rules! register_route_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/route_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: RouteWorld) {
            let _ = world;
        }
    };
}

register_route_scenario!(route_prints_analysis, "printing the analysed route");
register_route_scenario!(route_failure_is_not_ok, "printing not ok when routing fails");
register_route_scenario!(
    route_rejects_bad_latitude,
    "rejecting an out-of-range start latitude"
);
register_route_scenario!(route_rejects_missing_store, "rejecting a missing store");
