//! OSM PBF ingestion into the SQLite geo store.
//!
//! Entities stream into a [`StoreWriter`](sqlite::StoreWriter) which buffers
//! rows, flushes them in batches and finally builds the node-to-way indexes.
//! The store is assembled under a staging name beside the destination and
//! renamed into place only once everything has been committed.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use camino::{Utf8Path, Utf8PathBuf};
use geo::{Coord, Rect};
use osmpbf::{BlobDecode, BlobReader, Element};
use radlnavi_core::{EntityKind, Node, Way, store::schema::SchemaError};
use thiserror::Error;

mod batch;
mod sqlite;
mod tags;

pub use batch::IngestOptions;

use sqlite::StoreWriter;
use tags::collect_tags;

/// One decoded OpenStreetMap entity.
#[derive(Debug, Clone, PartialEq)]
pub enum OsmEntity {
    Node(Node),
    Way(Way),
    /// Relations are counted but not stored.
    Relation,
}

impl OsmEntity {
    fn from_element(element: Element<'_>) -> Self {
        match element {
            Element::Node(node) => Self::Node(Node::new(
                node.id(),
                node.lat(),
                node.lon(),
                collect_tags(node.tags()),
            )),
            Element::DenseNode(node) => Self::Node(Node::new(
                node.id(),
                node.lat(),
                node.lon(),
                collect_tags(node.tags()),
            )),
            Element::Way(way) => Self::Way(Way::new(
                way.id(),
                way.refs().collect(),
                collect_tags(way.tags()),
            )),
            Element::Relation(_) => Self::Relation,
        }
    }
}

/// Summary of raw OSM elements discovered during ingestion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OsmIngestSummary {
    /// Number of nodes discovered, including dense-node entries.
    pub nodes: u64,
    /// Number of ways discovered.
    pub ways: u64,
    /// Number of relations discovered.
    pub relations: u64,
    /// Bounding box covering all node coordinates, if any nodes were present.
    /// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
    pub bounds: Option<Rect<f64>>,
}

impl OsmIngestSummary {
    fn include_bounds(&mut self, bounds: Rect<f64>) {
        match &mut self.bounds {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(bounds.min().x),
                    y: existing.min().y.min(bounds.min().y),
                };
                let max = Coord {
                    x: existing.max().x.max(bounds.max().x),
                    y: existing.max().y.max(bounds.max().y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.bounds = Some(bounds),
        }
    }

    fn record_node(&mut self, lon: f64, lat: f64) {
        self.nodes += 1;
        if let Some(bounds) = Self::coordinate_bounds(lon, lat) {
            self.include_bounds(bounds);
        }
    }

    fn record_way(&mut self) {
        self.ways += 1;
    }

    fn record_relation(&mut self) {
        self.relations += 1;
    }

    fn coordinate_bounds(lon: f64, lat: f64) -> Option<Rect<f64>> {
        (lon.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lon)
            && (-90.0..=90.0).contains(&lat))
        .then(|| {
            let coordinate = Coord { x: lon, y: lat };
            Rect::new(coordinate, coordinate)
        })
    }
}

/// Detailed report of a completed ingestion run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OsmIngestReport {
    /// Element counts and bounding box information.
    pub summary: OsmIngestSummary,
    /// Rows written to `node_to_ways`, one per node reference of every way.
    pub node_to_way_rows: u64,
    /// Committed batch transactions.
    pub flushes: u64,
}

/// Errors returned when building a geo store.
#[derive(Debug, Error)]
pub enum OsmIngestError {
    #[error("failed to open OSM PBF file at {path:?}")]
    Open {
        #[source]
        source: osmpbf::Error,
        path: PathBuf,
    },
    #[error("failed to decode OSM PBF data at {path:?}")]
    Decode {
        #[source]
        source: osmpbf::Error,
        path: PathBuf,
    },
    /// The extract contains the same id twice for one entity kind.
    #[error("duplicate {kind} id {id} in extract")]
    DuplicateEntity { kind: EntityKind, id: i64 },
    /// Tags or a node list could not be encoded as JSON.
    #[error("failed to serialize {kind} {id}")]
    Serialize {
        kind: EntityKind,
        id: i64,
        #[source]
        source: serde_json::Error,
    },
    /// Failed to create the destination directory or clear a stale staging
    /// file.
    #[error("failed to prepare staging file {path:?}")]
    Stage {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create store layout in {path:?}")]
    Schema {
        path: Utf8PathBuf,
        #[source]
        source: SchemaError,
    },
    /// A SQLite statement failed while writing the staging file.
    #[error("sqlite failure during {operation} on {path:?}")]
    Sqlite {
        operation: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    /// Renaming the finished staging file onto the destination failed.
    #[error("failed to publish store at {path:?}")]
    Publish {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ingest an OSM PBF extract into a SQLite geo store at `output` using
/// [`IngestOptions::default`].
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use camino::Utf8Path;
/// use radlnavi_data::ingest_osm_pbf;
///
/// # fn main() -> Result<(), radlnavi_data::OsmIngestError> {
/// let report = ingest_osm_pbf(Path::new("oberbayern.osm.pbf"), Utf8Path::new("oberbayern.db"))?;
/// println!("Stored {} ways", report.summary.ways);
/// # Ok(())
/// # }
/// ```
pub fn ingest_osm_pbf(
    path: &Path,
    output: &Utf8Path,
) -> Result<OsmIngestReport, OsmIngestError> {
    ingest_osm_pbf_with(path, output, IngestOptions::default())
}

/// Ingest an OSM PBF extract with explicit batching options.
///
/// The extract is decoded blob by blob in file order. The first decode,
/// duplicate or write failure stops decoding, aborts the run and removes the
/// staging file; an existing store at `output` is left untouched.
pub fn ingest_osm_pbf_with(
    path: &Path,
    output: &Utf8Path,
    options: IngestOptions,
) -> Result<OsmIngestReport, OsmIngestError> {
    let blobs = BlobReader::from_path(path).map_err(|source| OsmIngestError::Open {
        source,
        path: path.to_path_buf(),
    })?;

    let mut writer = StoreWriter::create(output, options)?;
    match stream_blobs(blobs, &mut writer, path) {
        Ok(()) => writer.finish(),
        Err(err) => {
            writer.abandon();
            Err(err)
        }
    }
}

fn stream_blobs(
    blobs: BlobReader<BufReader<File>>,
    writer: &mut StoreWriter,
    path: &Path,
) -> Result<(), OsmIngestError> {
    let decode_error = |source| OsmIngestError::Decode {
        source,
        path: path.to_path_buf(),
    };
    for blob in blobs {
        let blob = blob.map_err(decode_error)?;
        // Header and unknown blobs carry no entities.
        if let BlobDecode::OsmData(block) = blob.decode().map_err(decode_error)? {
            for element in block.elements() {
                writer.push(OsmEntity::from_element(element))?;
            }
        }
    }
    Ok(())
}

/// Build a geo store at `output` from already decoded entities.
///
/// Shares the batching, validation and publication behaviour of
/// [`ingest_osm_pbf_with`].
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use radlnavi_core::{Node, Way};
/// use radlnavi_data::{IngestOptions, OsmEntity, build_geo_store};
///
/// let dir = tempfile::tempdir()?;
/// let output = Utf8PathBuf::from_path_buf(dir.path().join("tiny.db")).expect("utf-8 path");
/// let report = build_geo_store(
///     [
///         OsmEntity::Node(Node::with_empty_tags(1, 48.0, 11.0)),
///         OsmEntity::Node(Node::with_empty_tags(2, 48.1, 11.0)),
///         OsmEntity::Way(Way::with_empty_tags(7, vec![1, 2])),
///     ],
///     &output,
///     IngestOptions::default(),
/// )?;
/// assert_eq!(report.node_to_way_rows, 2);
/// assert!(output.is_file());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn build_geo_store<I>(
    entities: I,
    output: &Utf8Path,
    options: IngestOptions,
) -> Result<OsmIngestReport, OsmIngestError>
where
    I: IntoIterator<Item = OsmEntity>,
{
    let mut writer = StoreWriter::create(output, options)?;
    for entity in entities {
        if let Err(err) = writer.push(entity) {
            writer.abandon();
            return Err(err);
        }
    }
    writer.finish()
}
