//! SQLite layout shared by the ingestor that writes a store and the reader
//! that serves it.
//!
//! ```text
//! nodes(id INTEGER PRIMARY KEY, lat REAL, lon REAL, tags TEXT)
//! ways(id INTEGER PRIMARY KEY, node_list TEXT, tags TEXT)
//! node_to_ways(node_id INTEGER, way_id INTEGER)
//! geo_store_meta(key TEXT PRIMARY KEY, value TEXT)
//! ```
//!
//! `tags` and `node_list` hold JSON text. The node-to-way indexes are created
//! by [`create_indexes`] only after bulk loading has finished.

use rusqlite::{Connection, Error as SqliteError, OptionalExtension};
use thiserror::Error;

/// Layout version recorded under [`SCHEMA_VERSION_KEY`].
pub const SCHEMA_VERSION: i64 = 1;

/// Key of the schema version row in `geo_store_meta`.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Errors raised while creating or inspecting the store layout.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A DDL or bookkeeping statement failed.
    #[error("failed to execute schema step '{step}'")]
    Migration {
        /// Short description of the failing step.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The version row held something other than an integer.
    #[error("stored schema version {value:?} is not an integer")]
    InvalidVersion {
        /// Raw value read from `geo_store_meta`.
        value: String,
    },
}

/// Create the three entity relations and the metadata table.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use radlnavi_core::store::schema::{create_tables, read_schema_version, record_schema_version};
///
/// let conn = Connection::open_in_memory().expect("in-memory database");
/// create_tables(&conn).expect("create tables");
/// record_schema_version(&conn).expect("record version");
/// assert_eq!(read_schema_version(&conn).expect("read version"), Some(1));
/// ```
pub fn create_tables(connection: &Connection) -> Result<(), SchemaError> {
    run_schema_step(
        connection,
        "create nodes",
        "CREATE TABLE IF NOT EXISTS nodes (
            id INTEGER PRIMARY KEY,
            lat REAL NOT NULL,
            lon REAL NOT NULL,
            tags TEXT NOT NULL
        )",
    )?;
    run_schema_step(
        connection,
        "create ways",
        "CREATE TABLE IF NOT EXISTS ways (
            id INTEGER PRIMARY KEY,
            node_list TEXT NOT NULL,
            tags TEXT NOT NULL
        )",
    )?;
    run_schema_step(
        connection,
        "create node_to_ways",
        "CREATE TABLE IF NOT EXISTS node_to_ways (
            node_id INTEGER NOT NULL,
            way_id INTEGER NOT NULL
        )",
    )?;
    run_schema_step(
        connection,
        "create geo_store_meta",
        "CREATE TABLE IF NOT EXISTS geo_store_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        ) WITHOUT ROWID",
    )
}

/// Create the secondary indexes on `node_to_ways`.
pub fn create_indexes(connection: &Connection) -> Result<(), SchemaError> {
    run_schema_step(
        connection,
        "index node_to_ways by node",
        "CREATE INDEX IF NOT EXISTS node_to_ways_node_id ON node_to_ways(node_id)",
    )?;
    run_schema_step(
        connection,
        "index node_to_ways by way",
        "CREATE INDEX IF NOT EXISTS node_to_ways_way_id ON node_to_ways(way_id)",
    )
}

/// Write [`SCHEMA_VERSION`] into `geo_store_meta`, replacing any older row.
pub fn record_schema_version(connection: &Connection) -> Result<(), SchemaError> {
    connection
        .execute(
            "INSERT OR REPLACE INTO geo_store_meta (key, value) VALUES (?1, ?2)",
            (SCHEMA_VERSION_KEY, SCHEMA_VERSION.to_string()),
        )
        .map(|_| ())
        .map_err(|source| SchemaError::Migration {
            step: "record schema version",
            source,
        })
}

/// Read the recorded schema version.
///
/// Returns `Ok(None)` when the store predates the metadata table or never
/// recorded a version.
pub fn read_schema_version(connection: &Connection) -> Result<Option<i64>, SchemaError> {
    let has_meta: bool = connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'geo_store_meta')",
            [],
            |row| row.get(0),
        )
        .map_err(|source| SchemaError::Migration {
            step: "inspect sqlite_master",
            source,
        })?;
    if !has_meta {
        return Ok(None);
    }

    let raw: Option<String> = connection
        .query_row(
            "SELECT value FROM geo_store_meta WHERE key = ?1",
            [SCHEMA_VERSION_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    raw.map(|value| {
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| SchemaError::InvalidVersion { value })
    })
    .transpose()
}

fn run_schema_step(
    connection: &Connection,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    connection
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError::Migration { step, source })
}
