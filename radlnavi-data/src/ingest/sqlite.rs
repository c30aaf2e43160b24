//! Staged SQLite writer that assembles a geo store.
//!
//! Rows are buffered in memory and written in one transaction per batch.
//! Finalising writes the remainder, builds the node-to-way indexes and only
//! then renames the staging file onto the destination.
#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use radlnavi_core::{EntityKind, Node, NodeId, Tags, Way, WayId, store::schema};
use radlnavi_fs::{ensure_parent_dir, publish_file, remove_file_if_exists, staging_path};
use rusqlite::{Connection, Error as SqliteError, Transaction, ffi};

use super::{IngestOptions, OsmEntity, OsmIngestError, OsmIngestReport};

struct NodeRow {
    id: NodeId,
    lat: f64,
    lon: f64,
    tags: String,
}

struct WayRow {
    id: WayId,
    node_list: String,
    tags: String,
}

/// Encode tags as a JSON object with keys in ascending order, so the same
/// extract always yields the same column text.
fn encode_tags(tags: &Tags) -> serde_json::Result<String> {
    let sorted: BTreeMap<&String, &String> = tags.iter().collect();
    serde_json::to_string(&sorted)
}

pub(super) struct StoreWriter {
    destination: Utf8PathBuf,
    staging: Utf8PathBuf,
    connection: Connection,
    options: IngestOptions,
    nodes: Vec<NodeRow>,
    ways: Vec<WayRow>,
    links: Vec<(NodeId, WayId)>,
    report: OsmIngestReport,
}

impl StoreWriter {
    /// Open a fresh staging database beside `destination` and create the
    /// store layout in it.
    pub(super) fn create(
        destination: &Utf8Path,
        options: IngestOptions,
    ) -> Result<Self, OsmIngestError> {
        let staging = staging_path(destination);
        let stage_error = |source: std::io::Error| OsmIngestError::Stage {
            path: staging.clone(),
            source,
        };
        ensure_parent_dir(destination).map_err(stage_error)?;
        remove_file_if_exists(&staging).map_err(stage_error)?;

        let connection = Connection::open(staging.as_std_path())
            .map_err(|source| sqlite_failure("open staging database", &staging, source))?;
        let writer = Self {
            destination: destination.to_path_buf(),
            staging,
            connection,
            options,
            nodes: Vec::with_capacity(options.node_batch_size()),
            ways: Vec::with_capacity(options.way_batch_size()),
            links: Vec::new(),
            report: OsmIngestReport::default(),
        };
        match writer.prepare() {
            Ok(()) => Ok(writer),
            Err(err) => {
                writer.abandon();
                Err(err)
            }
        }
    }

    fn prepare(&self) -> Result<(), OsmIngestError> {
        self.connection
            .pragma_update(None, "synchronous", "OFF")
            .map_err(|source| sqlite_failure("configure staging database", &self.staging, source))?;
        schema::create_tables(&self.connection)
            .and_then(|()| schema::record_schema_version(&self.connection))
            .map_err(|source| OsmIngestError::Schema {
                path: self.staging.clone(),
                source,
            })
    }

    /// Buffer one entity, flushing once either batch threshold is reached.
    pub(super) fn push(&mut self, entity: OsmEntity) -> Result<(), OsmIngestError> {
        match entity {
            OsmEntity::Node(node) => self.push_node(node)?,
            OsmEntity::Way(way) => self.push_way(way)?,
            OsmEntity::Relation => self.report.summary.record_relation(),
        }

        if self.nodes.len() >= self.options.node_batch_size()
            || self.ways.len() >= self.options.way_batch_size()
        {
            self.flush()?;
        }
        Ok(())
    }

    fn push_node(&mut self, node: Node) -> Result<(), OsmIngestError> {
        let tags = encode_tags(&node.tags).map_err(|source| OsmIngestError::Serialize {
            kind: EntityKind::Node,
            id: node.id,
            source,
        })?;
        self.report.summary.record_node(node.lon, node.lat);
        self.nodes.push(NodeRow {
            id: node.id,
            lat: node.lat,
            lon: node.lon,
            tags,
        });
        Ok(())
    }

    fn push_way(&mut self, way: Way) -> Result<(), OsmIngestError> {
        let serialize_error = |source: serde_json::Error| OsmIngestError::Serialize {
            kind: EntityKind::Way,
            id: way.id,
            source,
        };
        let node_list = serde_json::to_string(&way.nodes).map_err(serialize_error)?;
        let tags = encode_tags(&way.tags).map_err(serialize_error)?;

        self.report.summary.record_way();
        self.links
            .extend(way.nodes.iter().map(|node_id| (*node_id, way.id)));
        self.ways.push(WayRow {
            id: way.id,
            node_list,
            tags,
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), OsmIngestError> {
        if self.nodes.is_empty() && self.ways.is_empty() {
            return Ok(());
        }
        let transaction = begin(&mut self.connection, &self.staging)?;
        write_batch(
            &transaction,
            &self.nodes,
            &self.ways,
            &self.links,
            &self.staging,
        )?;
        transaction
            .commit()
            .map_err(|source| sqlite_failure("commit batch", &self.staging, source))?;
        self.record_flush();
        Ok(())
    }

    fn record_flush(&mut self) {
        self.report.flushes += 1;
        self.report.node_to_way_rows += self.links.len() as u64;
        info!(
            "flushed batch {}: {} nodes, {} ways, {} node-to-way rows",
            self.report.flushes,
            self.nodes.len(),
            self.ways.len(),
            self.links.len()
        );
        self.nodes.clear();
        self.ways.clear();
        self.links.clear();
    }

    /// Write the remainder and build the indexes in one transaction.
    fn finalize(&mut self) -> Result<(), OsmIngestError> {
        let has_pending = !self.nodes.is_empty() || !self.ways.is_empty();
        let transaction = begin(&mut self.connection, &self.staging)?;
        write_batch(
            &transaction,
            &self.nodes,
            &self.ways,
            &self.links,
            &self.staging,
        )?;
        schema::create_indexes(&transaction).map_err(|source| OsmIngestError::Schema {
            path: self.staging.clone(),
            source,
        })?;
        transaction
            .commit()
            .map_err(|source| sqlite_failure("commit final batch", &self.staging, source))?;
        if has_pending {
            self.record_flush();
        }
        Ok(())
    }

    /// Finalise the staging database and publish it at the destination.
    pub(super) fn finish(mut self) -> Result<OsmIngestReport, OsmIngestError> {
        if let Err(err) = self.finalize() {
            self.abandon();
            return Err(err);
        }

        let Self {
            destination,
            staging,
            connection,
            report,
            ..
        } = self;
        if let Err((_, source)) = connection.close() {
            discard_staging(&staging);
            return Err(sqlite_failure("close staging database", &staging, source));
        }
        if let Err(source) = publish_file(&staging, &destination) {
            discard_staging(&staging);
            return Err(OsmIngestError::Publish {
                path: destination,
                source,
            });
        }

        info!(
            "published geo store {destination}: {} nodes, {} ways, {} relations skipped",
            report.summary.nodes, report.summary.ways, report.summary.relations
        );
        Ok(report)
    }

    /// Drop the connection and delete the staging file.
    pub(super) fn abandon(self) {
        let Self {
            staging,
            connection,
            ..
        } = self;
        drop(connection);
        discard_staging(&staging);
    }
}

fn begin<'c>(
    connection: &'c mut Connection,
    staging: &Utf8Path,
) -> Result<Transaction<'c>, OsmIngestError> {
    connection
        .transaction()
        .map_err(|source| sqlite_failure("begin batch", staging, source))
}

fn write_batch(
    transaction: &Transaction<'_>,
    nodes: &[NodeRow],
    ways: &[WayRow],
    links: &[(NodeId, WayId)],
    staging: &Utf8Path,
) -> Result<(), OsmIngestError> {
    if !nodes.is_empty() {
        let mut statement = transaction
            .prepare_cached("INSERT INTO nodes (id, lat, lon, tags) VALUES (?1, ?2, ?3, ?4)")
            .map_err(|source| sqlite_failure("prepare node insert", staging, source))?;
        for row in nodes {
            statement
                .execute((row.id, row.lat, row.lon, &row.tags))
                .map_err(|source| insert_failure(EntityKind::Node, row.id, staging, source))?;
        }
    }

    if !ways.is_empty() {
        let mut statement = transaction
            .prepare_cached("INSERT INTO ways (id, node_list, tags) VALUES (?1, ?2, ?3)")
            .map_err(|source| sqlite_failure("prepare way insert", staging, source))?;
        for row in ways {
            statement
                .execute((row.id, &row.node_list, &row.tags))
                .map_err(|source| insert_failure(EntityKind::Way, row.id, staging, source))?;
        }
    }

    if !links.is_empty() {
        let mut statement = transaction
            .prepare_cached("INSERT INTO node_to_ways (node_id, way_id) VALUES (?1, ?2)")
            .map_err(|source| sqlite_failure("prepare node_to_ways insert", staging, source))?;
        for (node_id, way_id) in links {
            statement
                .execute((node_id, way_id))
                .map_err(|source| sqlite_failure("insert node_to_ways", staging, source))?;
        }
    }
    Ok(())
}

fn insert_failure(
    kind: EntityKind,
    id: i64,
    staging: &Utf8Path,
    source: SqliteError,
) -> OsmIngestError {
    match &source {
        SqliteError::SqliteFailure(inner, _)
            if matches!(
                inner.extended_code,
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
            ) =>
        {
            OsmIngestError::DuplicateEntity { kind, id }
        }
        _ => {
            let operation = match kind {
                EntityKind::Node => "insert node",
                EntityKind::Way => "insert way",
            };
            sqlite_failure(operation, staging, source)
        }
    }
}

fn sqlite_failure(
    operation: &'static str,
    staging: &Utf8Path,
    source: SqliteError,
) -> OsmIngestError {
    OsmIngestError::Sqlite {
        operation,
        path: staging.to_path_buf(),
        source,
    }
}

fn discard_staging(staging: &Utf8Path) {
    if let Err(err) = remove_file_if_exists(staging) {
        warn!("failed to remove staging file {staging}: {err}");
    }
}
