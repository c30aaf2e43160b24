//! Core domain types and request logic for the radlnavi engine.
//!
//! Responsibilities:
//! - Model OpenStreetMap nodes and ways with free-form tags.
//! - Define the read-only [`GeoStore`] lookups and their SQLite and in-memory
//!   implementations.
//! - Reconstruct the ways a routed node path traverses and aggregate them by
//!   tag value.
//!
//! Invariants:
//! - Stores are immutable once opened; every request works on local data.
//! - No global mutable state.

pub mod aggregate;
pub mod analysis;
pub mod node;
pub mod reconstruct;
pub mod routing;
pub mod store;
pub mod way;

use std::collections::HashMap;

/// Free-form OpenStreetMap tags.
pub type Tags = HashMap<String, String>;

/// Identifier of an OpenStreetMap node, taken verbatim from the extract.
pub type NodeId = i64;

/// Identifier of an OpenStreetMap way, taken verbatim from the extract.
pub type WayId = i64;

pub use aggregate::{
    DEFAULT_TAG_KEYS, GeometryKind, LineStringGeometry, TagDistribution, TagInfo,
    UNKNOWN_TAG_VALUE, WayInfo, aggregate_tags,
};
pub use analysis::{
    AnalysedRoute, RouteAnalyser, RouteRequest, RouteResponse, TagDistributionRequest,
    TagDistributionResponse,
};
pub use node::Node;
pub use reconstruct::{Reconstruction, RouteSegment, reconstruct_route};
pub use routing::{RouteAnnotation, RouteProvider, RoutedPath, RoutingError};
pub use store::{EntityKind, GeoStore, GeoStoreError, MemoryGeoStore};
#[cfg(feature = "store-sqlite")]
pub use store::{SqliteGeoStore, SqliteGeoStoreConfig};
pub use way::Way;
