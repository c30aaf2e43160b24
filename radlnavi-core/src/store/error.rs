use std::{fmt, path::PathBuf, time::Duration};

use thiserror::Error;

/// Kind of persisted entity a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Way,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Way => f.write_str("way"),
        }
    }
}

/// Errors raised when opening or querying a geographic store.
#[derive(Debug, Error)]
pub enum GeoStoreError {
    /// The store artefact does not exist; the service cannot start.
    #[error("geo store {path:?} does not exist")]
    Unavailable {
        /// Location that was expected to hold the store.
        path: PathBuf,
    },
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open geo store at {path:?}")]
    Open {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The store was built with an incompatible schema.
    #[error("expected geo store schema version {expected} but found {found}")]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the store.
        found: i64,
    },
    /// A read query failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to {operation}")]
    Query {
        /// Short description of the failing step.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A read query did not finish before its deadline.
    #[error("{operation} exceeded the {timeout:?} query deadline")]
    Timeout {
        /// Short description of the interrupted step.
        operation: &'static str,
        /// Deadline that was exceeded.
        timeout: Duration,
    },
    /// A persisted tag map or node list was not valid JSON.
    #[error("failed to decode stored payload of {entity} {id}")]
    InvalidPayload {
        /// Kind of entity whose row was corrupt.
        entity: EntityKind,
        /// Identifier of the corrupt row.
        id: i64,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
}
