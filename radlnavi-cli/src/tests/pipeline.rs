//! Pipeline integration tests covering ingest followed by analysis.

use super::helpers::{Workspace, build_sample_store, decode_pbf_fixture, write_request};
use super::*;
use radlnavi_core::TagDistributionRequest;
use radlnavi_data::OsmIngestError;
use rstest::rstest;
use rusqlite::Connection;
use serde_json::Value;

fn run_cli(args: &[&str]) -> (Result<(), CliError>, Vec<u8>) {
    let mut stdout = Vec::new();
    let outcome = Cli::try_parse_from(args)
        .map_err(CliError::from)
        .and_then(|cli| dispatch(cli, &mut stdout));
    (outcome, stdout)
}

#[rstest]
fn ingested_extract_answers_analysis_requests() {
    let workspace = Workspace::new();
    let extract = decode_pbf_fixture(workspace.root(), "munich_cycleway");
    let store = workspace.path("munich.db");
    let request = workspace.path("request.json");
    write_request(
        &request,
        &TagDistributionRequest::new(vec![1, 2, 3, 4, 5]).with_tag_keys(["surface", "lit"]),
    );

    let (ingested, summary) = run_cli(&[
        "radlnavi",
        "ingest",
        "--osm-pbf",
        extract.as_str(),
        "--output",
        store.as_str(),
    ]);
    ingested.expect("ingest should succeed");
    let summary = String::from_utf8(summary).expect("summary utf-8");
    assert!(summary.contains("stored 5 nodes and 2 ways"), "{summary}");
    assert!(summary.contains("indexed 6 node-to-way rows"), "{summary}");

    let (analysed, output) = run_cli(&[
        "radlnavi",
        "analyse",
        request.as_str(),
        "--store",
        store.as_str(),
    ]);
    analysed.expect("analysis should succeed");
    let json: Value = serde_json::from_slice(&output).expect("analysis output is JSON");

    let distribution = &json["tag_distribution"];
    assert_eq!(distribution["surface"]["asphalt"]["ways"]["100"]["name"], "Isarradweg");
    assert_eq!(
        distribution["surface"]["paving_stones"]["ways"]["101"]["name"],
        "Kapuzinerstraße"
    );
    assert!(distribution["lit"]["yes"]["ways"]["100"].is_object());
    assert!(distribution["lit"]["unknown"]["ways"]["101"].is_object());
    let asphalt = distribution["surface"]["asphalt"]["distance"]
        .as_f64()
        .expect("distance is a number");
    assert!(asphalt > 200.0 && asphalt < 245.0, "asphalt distance {asphalt}");
}

#[rstest]
fn failed_ingest_keeps_the_previous_store() {
    let workspace = Workspace::new();
    let extract = decode_pbf_fixture(workspace.root(), "invalid");
    let store = workspace.path("sample.db");
    build_sample_store(&store);

    let (outcome, stdout) = run_cli(&[
        "radlnavi",
        "ingest",
        "--osm-pbf",
        extract.as_str(),
        "--output",
        store.as_str(),
    ]);
    match outcome.expect_err("corrupt extract should fail") {
        CliError::OsmIngest(OsmIngestError::Decode { .. }) => {}
        other => panic!("expected a decode failure, found {other:?}"),
    }
    assert!(stdout.is_empty());

    let connection = Connection::open(store.as_std_path()).expect("open previous store");
    let ways: i64 = connection
        .query_row("SELECT COUNT(*) FROM ways", [], |row| row.get(0))
        .expect("count ways");
    assert_eq!(ways, 2);
    assert!(!radlnavi_fs::staging_path(&store).exists());
}

#[rstest]
fn analysing_without_a_store_fails_before_reading_the_request() {
    let workspace = Workspace::new();
    let request = workspace.path("request.json");
    write_request(&request, &TagDistributionRequest::new(vec![1, 2]));
    let missing = workspace.path("absent.db");

    let (outcome, stdout) = run_cli(&[
        "radlnavi",
        "analyse",
        request.as_str(),
        "--store",
        missing.as_str(),
    ]);
    match outcome.expect_err("missing store should fail") {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_STORE);
            assert_eq!(path, missing);
        }
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
    assert!(stdout.is_empty());
}
