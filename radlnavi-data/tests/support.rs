//! Fixture plumbing shared by the ingestion scenarios.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use camino::Utf8PathBuf;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::{Builder, TempDir, TempPath};

/// Coordinates survive the PBF nanodegree grid and a SQLite REAL column.
const COORDINATE_TOLERANCE: f64 = 1.0e-7;

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Raw bytes of `<stem>.osm.pbf.b64`, ignoring line breaks in the encoding.
pub fn fixture_bytes(dir: &Path, stem: &str) -> Vec<u8> {
    let source = dir.join(format!("{stem}.osm.pbf.b64"));
    let text = fs::read_to_string(&source)
        .unwrap_or_else(|err| panic!("fixture {} unreadable: {err}", source.display()));
    let compact: String = text.split_ascii_whitespace().collect();
    STANDARD
        .decode(compact)
        .unwrap_or_else(|err| panic!("fixture {} is not Base64: {err}", source.display()))
}

/// Materialise a fixture as a temporary `.osm.pbf` file, removed on drop.
pub fn decode_fixture(dir: &Path, stem: &str) -> TempPath {
    let bytes = fixture_bytes(dir, stem);
    let mut file = Builder::new()
        .prefix(stem)
        .suffix(".osm.pbf")
        .tempfile()
        .unwrap_or_else(|err| panic!("no temporary file for {stem}: {err}"));
    file.write_all(&bytes)
        .and_then(|()| file.flush())
        .unwrap_or_else(|err| panic!("writing {stem} failed: {err}"));
    file.into_temp_path()
}

/// Destination for a store inside `dir`.
pub fn store_path(dir: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name))
        .unwrap_or_else(|path| panic!("temporary path {path:?} is not UTF-8"))
}

#[expect(
    clippy::float_arithmetic,
    reason = "tolerance checks subtract coordinates"
)]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= COORDINATE_TOLERANCE,
        "coordinate {actual} differs from {expected}"
    );
}
