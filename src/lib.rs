//! Facade crate for the radlnavi route analysis engine.
//!
//! This crate re-exports the core domain types and exposes the SQLite-backed
//! store behind a feature flag.

#![forbid(unsafe_code)]

pub use radlnavi_core::{
    AnalysedRoute, DEFAULT_TAG_KEYS, GeoStore, GeoStoreError, LineStringGeometry, MemoryGeoStore,
    Node, NodeId, Reconstruction, RouteAnalyser, RouteAnnotation, RouteProvider, RouteRequest,
    RouteResponse, RouteSegment, RoutedPath, RoutingError, TagDistribution,
    TagDistributionRequest, TagDistributionResponse, TagInfo, Tags, UNKNOWN_TAG_VALUE, Way, WayId,
    WayInfo, aggregate_tags, reconstruct_route,
};

#[cfg(feature = "store-sqlite")]
pub use radlnavi_core::{SqliteGeoStore, SqliteGeoStoreConfig};
