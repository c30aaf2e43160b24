//! Test helpers for laying out request files, fixtures and small stores.

use base64::{Engine as _, engine::general_purpose};
use camino::{Utf8Path, Utf8PathBuf};
use radlnavi_core::{Node, Tags, TagDistributionRequest, Way};
use radlnavi_data::{IngestOptions, OsmEntity, build_geo_store};
use std::fs;
use tempfile::TempDir;

/// Temporary directory addressed through UTF-8 paths.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write test file");
}

/// Decode one of the data crate's Base64 PBF fixtures into `dir`.
pub(super) fn decode_pbf_fixture(dir: &Utf8Path, stem: &str) -> Utf8PathBuf {
    let encoded_path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../radlnavi-data/tests/fixtures")
        .join(format!("{stem}.osm.pbf.b64"));
    let encoded = fs::read_to_string(encoded_path.as_std_path())
        .unwrap_or_else(|err| panic!("failed to read fixture {encoded_path}: {err}"));
    let cleaned: String = encoded
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    let decoded = general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .unwrap_or_else(|err| panic!("failed to decode fixture {encoded_path}: {err}"));
    let output = dir.join(format!("{stem}.osm.pbf"));
    write_utf8(&output, &decoded);
    output
}

fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

/// Build a store with two ways along a meridian: way 10 over nodes 1-3 and
/// way 11 over nodes 3-4.
pub(super) fn build_sample_store(path: &Utf8Path) {
    let nodes = (1..=4_i64).map(|id| Node::with_empty_tags(id, 48.0 + id as f64 * 1e-3, 11.0));
    let ways = [
        Way::new(
            10,
            vec![1, 2, 3],
            tags(&[("surface", "asphalt"), ("lit", "yes"), ("name", "Isarradweg")]),
        ),
        Way::new(11, vec![3, 4], tags(&[("surface", "gravel")])),
    ];
    let entities = nodes
        .map(OsmEntity::Node)
        .chain(ways.into_iter().map(OsmEntity::Way));
    build_geo_store(entities, path, IngestOptions::default()).expect("build sample store");
}

pub(super) fn write_request(path: &Utf8Path, request: &TagDistributionRequest) {
    let payload = serde_json::to_string_pretty(request).expect("serialize request");
    write_utf8(path, payload.as_bytes());
}
