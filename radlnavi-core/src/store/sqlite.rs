//! SQLite-backed store over an immutable, published artefact.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use log::info;
use rusqlite::{Connection, ErrorCode, OpenFlags, Row, params_from_iter};

use crate::{Node, NodeId, Tags, Way, WayId};

use super::schema::{SCHEMA_VERSION, SchemaError, read_schema_version};
use super::{EntityKind, GeoStore, GeoStoreError, MemoryGeoStore};

/// SQLite limits bound parameters per statement to 999 by default. The store
/// chunks `IN` queries to remain below that ceiling.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// Virtual machine instructions between deadline checks.
const PROGRESS_INTERVAL: i32 = 1_000;

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for [`SqliteGeoStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteGeoStoreConfig {
    /// Deadline applied to each lookup. `None` disables the check.
    pub query_timeout: Option<Duration>,
}

impl Default for SqliteGeoStoreConfig {
    fn default() -> Self {
        Self {
            query_timeout: Some(DEFAULT_QUERY_TIMEOUT),
        }
    }
}

impl SqliteGeoStoreConfig {
    /// Override the per-lookup deadline.
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Let lookups run to completion however long they take.
    #[must_use]
    pub fn without_query_timeout(mut self) -> Self {
        self.query_timeout = None;
        self
    }
}

/// Read-only store backed by a single SQLite file.
///
/// The file is opened with `immutable=1`, so SQLite takes no locks and the
/// connection never observes writes. `Connection` is `Send` but not `Sync`:
/// give each worker its own handle via [`SqliteGeoStore::try_clone`] or load
/// the data into a [`MemoryGeoStore`] for shared access.
pub struct SqliteGeoStore {
    path: PathBuf,
    config: SqliteGeoStoreConfig,
    connection: Connection,
}

impl fmt::Debug for SqliteGeoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteGeoStore")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteGeoStore {
    /// Open the store at `path` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`GeoStoreError::Unavailable`] when the file does not exist,
    /// [`GeoStoreError::Open`] when SQLite rejects it and
    /// [`GeoStoreError::VersionMismatch`] when it was written with another
    /// layout version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GeoStoreError> {
        Self::open_with_config(path, SqliteGeoStoreConfig::default())
    }

    /// Open the store at `path` with explicit settings.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: SqliteGeoStoreConfig,
    ) -> Result<Self, GeoStoreError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GeoStoreError::Unavailable {
                path: path.to_path_buf(),
            });
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection =
            Connection::open_with_flags(immutable_uri(path), flags).map_err(|source| {
                GeoStoreError::Open {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        ensure_schema_version(&connection, path)?;
        info!("opened geo store at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            config,
            connection,
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings the store was opened with.
    #[must_use]
    pub fn config(&self) -> &SqliteGeoStoreConfig {
        &self.config
    }

    /// Open an independent connection to the same file.
    pub fn try_clone(&self) -> Result<Self, GeoStoreError> {
        Self::open_with_config(&self.path, self.config.clone())
    }

    /// Read every node and way into a [`MemoryGeoStore`].
    ///
    /// The copy is taken without a deadline since it scans whole tables.
    pub fn load_into_memory(&self) -> Result<MemoryGeoStore, GeoStoreError> {
        let nodes = collect_rows(
            &self.connection,
            "SELECT id, lat, lon, tags FROM nodes",
            "load nodes",
            &[],
            node_from_row,
        )?;
        let ways = collect_rows(
            &self.connection,
            "SELECT id, node_list, tags FROM ways",
            "load ways",
            &[],
            way_from_row,
        )?;
        info!(
            "loaded {} nodes and {} ways from {} into memory",
            nodes.len(),
            ways.len(),
            self.path.display()
        );
        Ok(MemoryGeoStore::from_entities(nodes, ways))
    }

    fn with_deadline<T>(
        &self,
        operation: &'static str,
        run: impl FnOnce(&Connection) -> Result<T, GeoStoreError>,
    ) -> Result<T, GeoStoreError> {
        let Some(timeout) = self.config.query_timeout else {
            return run(&self.connection);
        };

        let deadline = Instant::now() + timeout;
        self.connection
            .progress_handler(PROGRESS_INTERVAL, Some(move || Instant::now() >= deadline));
        let result = run(&self.connection);
        self.connection.progress_handler(0, None::<fn() -> bool>);

        result.map_err(|err| match err {
            GeoStoreError::Query { source, .. } if is_interrupt(&source) => {
                GeoStoreError::Timeout { operation, timeout }
            }
            other => other,
        })
    }
}

impl GeoStore for SqliteGeoStore {
    fn nodes_by_id(&self, ids: &HashSet<NodeId>) -> Result<HashMap<NodeId, Node>, GeoStoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = sorted_ids(ids);

        self.with_deadline("look up nodes by id", |connection| {
            let mut found = HashMap::with_capacity(ids.len());
            for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let query =
                    format!("SELECT id, lat, lon, tags FROM nodes WHERE id IN ({placeholders})");
                let nodes =
                    collect_rows(connection, &query, "look up nodes by id", chunk, node_from_row)?;
                found.extend(nodes.into_iter().map(|node| (node.id, node)));
            }
            Ok(found)
        })
    }

    fn ways_touching_nodes(
        &self,
        ids: &HashSet<NodeId>,
    ) -> Result<HashMap<WayId, Way>, GeoStoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = sorted_ids(ids);

        self.with_deadline("look up ways touching nodes", |connection| {
            let mut found = HashMap::new();
            for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let query = format!(
                    "SELECT DISTINCT w.id, w.node_list, w.tags \
                     FROM node_to_ways ntw JOIN ways w ON ntw.way_id = w.id \
                     WHERE ntw.node_id IN ({placeholders})"
                );
                let ways = collect_rows(
                    connection,
                    &query,
                    "look up ways touching nodes",
                    chunk,
                    way_from_row,
                )?;
                found.extend(ways.into_iter().map(|way| (way.id, way)));
            }
            Ok(found)
        })
    }
}

/// Failure while decoding a single row.
enum RowError {
    Sqlite(rusqlite::Error),
    Payload {
        entity: EntityKind,
        id: i64,
        source: serde_json::Error,
    },
}

impl From<rusqlite::Error> for RowError {
    fn from(source: rusqlite::Error) -> Self {
        Self::Sqlite(source)
    }
}

fn collect_rows<T>(
    connection: &Connection,
    query: &str,
    operation: &'static str,
    params: &[i64],
    decode: fn(&Row<'_>) -> Result<T, RowError>,
) -> Result<Vec<T>, GeoStoreError> {
    let query_error = |source: rusqlite::Error| GeoStoreError::Query { operation, source };

    let mut statement = connection.prepare(query).map_err(query_error)?;
    let mut rows = statement
        .query(params_from_iter(params.iter()))
        .map_err(query_error)?;

    let mut decoded = Vec::new();
    while let Some(row) = rows.next().map_err(query_error)? {
        let value = decode(row).map_err(|err| match err {
            RowError::Sqlite(source) => GeoStoreError::Query { operation, source },
            RowError::Payload { entity, id, source } => {
                GeoStoreError::InvalidPayload { entity, id, source }
            }
        })?;
        decoded.push(value);
    }
    Ok(decoded)
}

fn node_from_row(row: &Row<'_>) -> Result<Node, RowError> {
    let id: NodeId = row.get(0)?;
    let lat: f64 = row.get(1)?;
    let lon: f64 = row.get(2)?;
    let tags_json: String = row.get(3)?;
    let tags: Tags = serde_json::from_str(&tags_json).map_err(|source| RowError::Payload {
        entity: EntityKind::Node,
        id,
        source,
    })?;
    Ok(Node::new(id, lat, lon, tags))
}

fn way_from_row(row: &Row<'_>) -> Result<Way, RowError> {
    let id: WayId = row.get(0)?;
    let node_list: String = row.get(1)?;
    let tags_json: String = row.get(2)?;
    let payload = |source: serde_json::Error| RowError::Payload {
        entity: EntityKind::Way,
        id,
        source,
    };
    let nodes: Vec<NodeId> = serde_json::from_str(&node_list).map_err(payload)?;
    let tags: Tags = serde_json::from_str(&tags_json).map_err(payload)?;
    Ok(Way::new(id, nodes, tags))
}

fn ensure_schema_version(connection: &Connection, path: &Path) -> Result<(), GeoStoreError> {
    let found = read_schema_version(connection).map_err(|err| match err {
        SchemaError::Migration { source, .. } => GeoStoreError::Open {
            path: path.to_path_buf(),
            source,
        },
        SchemaError::InvalidVersion { .. } => GeoStoreError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found: 0,
        },
    })?;

    match found {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(GeoStoreError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => Err(GeoStoreError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found: 0,
        }),
    }
}

fn is_interrupt(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::OperationInterrupted
    )
}

fn sorted_ids(ids: &HashSet<NodeId>) -> Vec<NodeId> {
    let mut ids: Vec<NodeId> = ids.iter().copied().collect();
    ids.sort_unstable();
    ids
}

/// Build a read-only `immutable=1` URI for `path`, escaping characters with
/// meaning inside SQLite URIs.
fn immutable_uri(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '?' => escaped.push_str("%3f"),
            '#' => escaped.push_str("%23"),
            other => escaped.push(other),
        }
    }
    format!("file:{escaped}?mode=ro&immutable=1")
}
