//! Offline ingestion and routing-engine adapters for the radlnavi engine.
//!
//! Responsibilities:
//! - Turn an OpenStreetMap PBF extract into the SQLite store read by
//!   [`radlnavi_core::SqliteGeoStore`].
//! - Talk to an OSRM routing service on behalf of
//!   [`radlnavi_core::RouteAnalyser`].
//!
//! Boundaries:
//! - Do not encode domain rules (live in `radlnavi-core`).
//! - Stores are published atomically; a failed run never leaves a partial
//!   artefact at the destination.
//!
//! Invariants:
//! - No global mutable state.

pub mod ingest;
pub mod routing;

pub use ingest::{
    IngestOptions, OsmEntity, OsmIngestError, OsmIngestReport, OsmIngestSummary, build_geo_store,
    ingest_osm_pbf, ingest_osm_pbf_with,
};
