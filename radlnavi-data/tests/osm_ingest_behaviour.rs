//! Behavioural tests for the `ingest_osm_pbf` entry point.

use camino::Utf8PathBuf;
use radlnavi_core::{EntityKind, GeoStore, SqliteGeoStore};
use radlnavi_data::{
    IngestOptions, OsmIngestError, OsmIngestReport, ingest_osm_pbf, ingest_osm_pbf_with,
};
use radlnavi_fs::staging_path;
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, scenario, then, when};
use std::{
    cell::RefCell,
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tempfile::{TempDir, TempPath};

mod support;

use support::{assert_close, decode_fixture, fixture_bytes, store_path};

type IngestionResult = RefCell<Option<Result<OsmIngestReport, OsmIngestError>>>;

const PREVIOUS_STORE: &[u8] = b"previously published store";

#[fixture]
fn fixtures_dir() -> PathBuf {
    support::fixtures_dir()
}

#[fixture]
fn store_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

enum FixtureTarget {
    Existing(TempPath),
    Missing(PathBuf),
}

impl FixtureTarget {
    fn path(&self) -> &Path {
        match self {
            FixtureTarget::Existing(temp) => temp.as_ref(),
            FixtureTarget::Missing(path) => path.as_path(),
        }
    }
}

#[fixture]
fn target_fixture() -> RefCell<Option<FixtureTarget>> {
    RefCell::new(None)
}

#[fixture]
fn ingestion_result() -> IngestionResult {
    RefCell::new(None)
}

fn output(dir: &TempDir) -> Utf8PathBuf {
    store_path(dir, "store.db")
}

fn expect_report(result: &IngestionResult) -> OsmIngestReport {
    result
        .borrow()
        .as_ref()
        .expect("ingestion was attempted")
        .as_ref()
        .expect("expected successful ingestion")
        .clone()
}

fn open_store(dir: &TempDir) -> SqliteGeoStore {
    SqliteGeoStore::open(output(dir)).expect("published store opens")
}

#[given("a PBF extract with 5 nodes, 2 ways and 1 relation")]
fn valid_dataset(
    #[from(fixtures_dir)] dir: PathBuf,
    #[from(target_fixture)] target: &RefCell<Option<FixtureTarget>>,
) {
    let fixture = decode_fixture(&dir, "munich_cycleway");
    *target.borrow_mut() = Some(FixtureTarget::Existing(fixture));
}

#[given("a path to a missing PBF file")]
fn missing_dataset(
    #[from(fixtures_dir)] dir: PathBuf,
    #[from(target_fixture)] target: &RefCell<Option<FixtureTarget>>,
) {
    *target.borrow_mut() = Some(FixtureTarget::Missing(dir.join("missing.osm.pbf")));
}

#[given("a path to a file containing invalid PBF data")]
fn invalid_dataset(
    #[from(fixtures_dir)] dir: PathBuf,
    #[from(target_fixture)] target: &RefCell<Option<FixtureTarget>>,
) {
    let fixture = decode_fixture(&dir, "invalid");
    *target.borrow_mut() = Some(FixtureTarget::Existing(fixture));
}

#[given("a previously published store")]
fn previous_store(#[from(store_dir)] dir: &TempDir) {
    fs::write(output(dir), PREVIOUS_STORE).expect("seed previous store");
}

#[when("I ingest the extract")]
fn ingest_selected(
    #[from(store_dir)] dir: &TempDir,
    #[from(target_fixture)] target: &RefCell<Option<FixtureTarget>>,
    #[from(ingestion_result)] result: &IngestionResult,
) {
    let outcome = {
        let guard = target.borrow();
        let borrowed = guard.as_ref().expect("target path prepared");
        ingest_osm_pbf(borrowed.path(), &output(dir))
    };
    *result.borrow_mut() = Some(outcome);
}

#[then("the report counts 5 nodes, 2 ways and 1 relation")]
fn report_counts(#[from(ingestion_result)] result: &IngestionResult) {
    let report = expect_report(result);
    assert_eq!(report.summary.nodes, 5, "expected five nodes");
    assert_eq!(report.summary.ways, 2, "expected two ways");
    assert_eq!(report.summary.relations, 1, "expected one relation");
    assert_eq!(report.node_to_way_rows, 6, "one row per way node reference");
}

#[then("the report bounding box spans the sample coordinates")]
fn report_bounds(#[from(ingestion_result)] result: &IngestionResult) {
    let report = expect_report(result);
    let bounds = report
        .summary
        .bounds
        .as_ref()
        .expect("sample data should produce a bounding box");
    let min = bounds.min();
    let max = bounds.max();
    assert_close(min.x, 11.575);
    assert_close(max.x, 11.577);
    assert_close(min.y, 48.137);
    assert_close(max.y, 48.140);
}

#[then("node 3 is shared by ways 100 and 101 in the store")]
fn shared_node(#[from(store_dir)] dir: &TempDir) {
    let store = open_store(dir);
    let ways = store
        .ways_touching_nodes(&HashSet::from([3]))
        .expect("way lookup");
    let ids: HashSet<i64> = ways.keys().copied().collect();
    assert_eq!(ids, HashSet::from([100, 101]));

    let nodes = store.nodes_by_id(&HashSet::from([3])).expect("node lookup");
    let node = nodes.get(&3).expect("node 3 stored");
    assert_close(node.lat, 48.139);
    assert_close(node.lon, 11.575);
}

#[then("way 101 keeps its name tag")]
fn way_tags(#[from(store_dir)] dir: &TempDir) {
    let store = open_store(dir);
    let ways = store
        .ways_touching_nodes(&HashSet::from([5]))
        .expect("way lookup");
    let way = ways.get(&101).expect("way 101 stored");
    assert_eq!(way.tag("name"), Some("Kapuzinerstraße"));
    assert_eq!(way.tag("surface"), Some("paving_stones"));
    assert_eq!(way.nodes, vec![3, 4, 5]);
}

#[then("an open error is returned")]
fn open_error(#[from(ingestion_result)] result: &IngestionResult) {
    let borrowed = result.borrow();
    let outcome = borrowed.as_ref().expect("ingestion was attempted");
    match outcome {
        Ok(_) => panic!("expected an error for the missing file"),
        Err(OsmIngestError::Open { path, .. }) => {
            assert!(
                path.ends_with("missing.osm.pbf"),
                "unexpected path in error: {path:?}"
            );
        }
        Err(other) => panic!("expected an open error, got {other:?}"),
    }
}

#[then("a decode error is returned")]
fn decode_error(#[from(ingestion_result)] result: &IngestionResult) {
    let borrowed = result.borrow();
    let outcome = borrowed.as_ref().expect("ingestion was attempted");
    match outcome {
        Ok(_) => panic!("expected an error for the invalid data"),
        Err(OsmIngestError::Decode { source, path }) => {
            let extension = path.extension().and_then(|ext| ext.to_str());
            assert_eq!(extension, Some("pbf"), "unexpected path in error: {path:?}");
            assert!(
                !source.to_string().is_empty(),
                "decode error should preserve the source message"
            );
        }
        Err(other) => panic!("expected a decode error, got {other:?}"),
    }
}

#[then("no store is published")]
fn nothing_published(#[from(store_dir)] dir: &TempDir) {
    let destination = output(dir);
    assert!(!destination.exists(), "destination must stay absent");
    assert!(
        !staging_path(&destination).exists(),
        "staging file must be removed"
    );
}

#[then("the previous store is untouched")]
fn previous_untouched(#[from(store_dir)] dir: &TempDir) {
    let contents = fs::read(output(dir)).expect("previous store still present");
    assert_eq!(contents, PREVIOUS_STORE);
    assert!(!staging_path(&output(dir)).exists());
}

#[rstest]
fn decoding_stops_at_the_first_rejected_entity(fixtures_dir: PathBuf, store_dir: TempDir) {
    // The extract twice over repeats every id, then ends in a frame that is
    // not a blob header. Only a run that keeps decoding would reach it.
    let mut bytes = fixture_bytes(&fixtures_dir, "munich_cycleway");
    bytes.extend_from_within(..);
    bytes.extend_from_slice(&[0, 0, 0, 8]);
    bytes.extend_from_slice(b"garbage!");
    let extract = store_dir.path().join("repeated.osm.pbf");
    fs::write(&extract, &bytes).expect("write repeated extract");
    let destination = output(&store_dir);

    let outcome = ingest_osm_pbf_with(
        &extract,
        &destination,
        IngestOptions::default().with_node_batch_size(1),
    );

    assert!(
        matches!(
            outcome,
            Err(OsmIngestError::DuplicateEntity {
                kind: EntityKind::Node,
                ..
            })
        ),
        "expected the repeated node to abort ingestion, got {outcome:?}"
    );
    assert!(!destination.exists());
    assert!(!staging_path(&destination).exists());
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/features/ingest_osm_pbf.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature:?}: {err}");
    });
    let titles: Vec<String> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .map(|title| title.to_owned())
        .collect();
    let expected = [
        "storing a cycling extract",
        "reporting a missing file",
        "rejecting a corrupted extract",
        "keeping the previous store when ingestion fails",
    ];
    assert_eq!(
        titles.len(),
        expected.len(),
        "scenario count changed in feature file: {titles:?}"
    );
    for (index, expected_title) in expected.iter().enumerate() {
        let actual = titles.get(index).map(String::as_str);
        assert_eq!(
            actual,
            Some(*expected_title),
            "scenario at index {index} does not match feature order"
        );
    }
}

#[scenario(path = "tests/features/ingest_osm_pbf.feature", index = 0)]
fn storing_cycling_extract(
    fixtures_dir: PathBuf,
    store_dir: TempDir,
    target_fixture: RefCell<Option<FixtureTarget>>,
    ingestion_result: IngestionResult,
) {
    let _ = (fixtures_dir, store_dir, target_fixture, ingestion_result);
}

#[scenario(path = "tests/features/ingest_osm_pbf.feature", index = 1)]
fn reporting_missing_files(
    fixtures_dir: PathBuf,
    store_dir: TempDir,
    target_fixture: RefCell<Option<FixtureTarget>>,
    ingestion_result: IngestionResult,
) {
    let _ = (fixtures_dir, store_dir, target_fixture, ingestion_result);
}

#[scenario(path = "tests/features/ingest_osm_pbf.feature", index = 2)]
fn rejecting_invalid_payloads(
    fixtures_dir: PathBuf,
    store_dir: TempDir,
    target_fixture: RefCell<Option<FixtureTarget>>,
    ingestion_result: IngestionResult,
) {
    let _ = (fixtures_dir, store_dir, target_fixture, ingestion_result);
}

#[scenario(path = "tests/features/ingest_osm_pbf.feature", index = 3)]
fn keeping_previous_store(
    fixtures_dir: PathBuf,
    store_dir: TempDir,
    target_fixture: RefCell<Option<FixtureTarget>>,
    ingestion_result: IngestionResult,
) {
    let _ = (fixtures_dir, store_dir, target_fixture, ingestion_result);
}
