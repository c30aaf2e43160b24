use geo::Point;
use serde::{Deserialize, Serialize};

use crate::{NodeId, Tags};

/// A single OpenStreetMap node.
///
/// Coordinates are WGS84 degrees. [`Node::location`] yields `(lat, lon)`
/// while [`Node::coord`] yields `(lon, lat)`; GeoJSON output always uses the
/// latter.
///
/// # Examples
/// ```
/// use radlnavi_core::Node;
///
/// let node = Node::with_empty_tags(7, 48.137, 11.575);
/// assert_eq!(node.location(), (48.137, 11.575));
/// assert_eq!(node.coord(), (11.575, 48.137));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tags: Tags,
}

impl Node {
    /// Construct a `Node` with the provided tags.
    pub fn new(id: NodeId, lat: f64, lon: f64, tags: Tags) -> Self {
        Self { id, lat, lon, tags }
    }

    /// Construct a `Node` without tags.
    pub fn with_empty_tags(id: NodeId, lat: f64, lon: f64) -> Self {
        Self::new(id, lat, lon, Tags::new())
    }

    /// Position as `(lat, lon)`, the order used by the store.
    #[must_use]
    pub const fn location(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }

    /// Position as `(lon, lat)`, the order used by GeoJSON.
    #[must_use]
    pub const fn coord(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }

    /// Position as a `geo` point with `x = longitude` and `y = latitude`.
    #[must_use]
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}
