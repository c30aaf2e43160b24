//! Group reconstructed way segments by tag value and sum travelled distance.

use std::collections::{BTreeMap, HashSet};

use geo::{Distance, Geodesic};
use serde::{Deserialize, Serialize};

use crate::{RouteSegment, WayId, reconstruct::Reconstruction};

/// Bucket used when a way does not carry the requested tag.
pub const UNKNOWN_TAG_VALUE: &str = "unknown";

/// Tag keys analysed when a request does not name any.
pub const DEFAULT_TAG_KEYS: [&str; 3] = ["class:bicycle", "lit", "surface"];

/// GeoJSON geometry discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    #[default]
    LineString,
}

/// GeoJSON `LineString` of `[lon, lat]` positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineStringGeometry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub coordinates: Vec<[f64; 2]>,
}

impl LineStringGeometry {
    /// Wrap `[lon, lat]` positions.
    #[must_use]
    pub fn new(coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            kind: GeometryKind::LineString,
            coordinates,
        }
    }
}

/// Display data for one way inside a tag bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WayInfo {
    pub name: String,
    pub geometry: LineStringGeometry,
}

/// Everything the route did on ways sharing one tag value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagInfo {
    /// Metres travelled, geodesic on the WGS84 ellipsoid.
    pub distance: f64,
    pub ways: BTreeMap<WayId, WayInfo>,
}

/// `tag key -> tag value -> TagInfo`, ordered for stable output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagDistribution(BTreeMap<String, BTreeMap<String, TagInfo>>);

impl TagDistribution {
    /// Buckets recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BTreeMap<String, TagInfo>> {
        self.0.get(key)
    }

    /// The bucket for `key = value`.
    #[must_use]
    pub fn bucket(&self, key: &str, value: &str) -> Option<&TagInfo> {
        self.0.get(key).and_then(|values| values.get(value))
    }

    /// Analysed keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the nested maps.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, BTreeMap<String, TagInfo>> {
        self.0
    }
}

/// Bucket every segment of `reconstruction` by its value for each of `keys`.
///
/// Keys repeated in `keys` are analysed once. A way lacking a key lands in
/// the [`UNKNOWN_TAG_VALUE`] bucket. A key with no segments produces no entry.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use radlnavi_core::{Node, Tags, Way, aggregate_tags, reconstruct_route};
///
/// let nodes = HashMap::from([
///     (1, Node::with_empty_tags(1, 48.0, 11.0)),
///     (2, Node::with_empty_tags(2, 48.001, 11.0)),
/// ]);
/// let tags = Tags::from([("surface".to_owned(), "asphalt".to_owned())]);
/// let ways = HashMap::from([(5, Way::new(5, vec![1, 2], tags))]);
///
/// let reconstruction = reconstruct_route(&[1, 2], &nodes, &ways);
/// let distribution = aggregate_tags(&reconstruction, &["surface", "lit"]);
///
/// let asphalt = distribution.bucket("surface", "asphalt").expect("asphalt bucket");
/// assert!((asphalt.distance - 111.2).abs() < 0.5);
/// assert!(distribution.bucket("lit", "unknown").is_some());
/// ```
pub fn aggregate_tags<K: AsRef<str>>(
    reconstruction: &Reconstruction<'_>,
    keys: &[K],
) -> TagDistribution {
    let mut distribution = BTreeMap::new();
    if reconstruction.is_empty() {
        return TagDistribution(distribution);
    }

    let measured: Vec<(&RouteSegment<'_>, f64)> = reconstruction
        .segments()
        .iter()
        .map(|segment| (segment, segment_distance(segment)))
        .collect();

    let mut seen = HashSet::new();
    for key in keys.iter().map(AsRef::as_ref) {
        if !seen.insert(key) {
            continue;
        }
        let buckets: &mut BTreeMap<String, TagInfo> =
            distribution.entry(key.to_owned()).or_default();
        for (segment, distance) in &measured {
            let way = segment.way();
            let value = way.tag(key).unwrap_or(UNKNOWN_TAG_VALUE);
            let bucket = buckets.entry(value.to_owned()).or_default();
            bucket.distance += distance;
            bucket.ways.insert(
                way.id,
                WayInfo {
                    name: way.tag("name").unwrap_or_default().to_owned(),
                    geometry: LineStringGeometry::new(segment.coordinates()),
                },
            );
        }
    }

    TagDistribution(distribution)
}

/// Geodesic length of the pairs the route actually travelled.
#[must_use]
pub fn segment_distance(segment: &RouteSegment<'_>) -> f64 {
    segment
        .traversed_pairs()
        .map(|(from, to)| Geodesic.distance(from.point(), to.point()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, NodeId, Tags, Way, reconstruct_route};
    use rstest::{fixture, rstest};
    use std::collections::HashMap;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    struct Graph {
        nodes: HashMap<NodeId, Node>,
        ways: HashMap<i64, Way>,
    }

    /// Two consecutive ways along a meridian, 0.001 degrees per node.
    #[fixture]
    fn graph() -> Graph {
        let nodes = (1..=5)
            .map(|id| (id, Node::with_empty_tags(id, 48.0 + id as f64 * 1e-3, 11.0)))
            .collect();
        let ways = [
            Way::new(
                1,
                vec![1, 2, 3],
                tags(&[("surface", "asphalt"), ("name", "Isarradweg"), ("lit", "yes")]),
            ),
            Way::new(2, vec![3, 4, 5], tags(&[("surface", "gravel")])),
        ]
        .into_iter()
        .map(|way| (way.id, way))
        .collect();
        Graph { nodes, ways }
    }

    #[rstest]
    fn buckets_by_value_and_defaults_missing_tags(graph: Graph) {
        let reconstruction = reconstruct_route(&[1, 2, 3, 4, 5], &graph.nodes, &graph.ways);
        let distribution = aggregate_tags(&reconstruction, &DEFAULT_TAG_KEYS);

        let surface = distribution.get("surface").expect("surface analysed");
        assert_eq!(
            surface.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["asphalt", "gravel"]
        );
        let lit = distribution.get("lit").expect("lit analysed");
        assert!(lit.get("yes").is_some_and(|info| info.ways.contains_key(&1)));
        assert!(lit.get(UNKNOWN_TAG_VALUE).is_some_and(|info| info.ways.contains_key(&2)));

        let class = distribution.get("class:bicycle").expect("class analysed");
        assert_eq!(class.len(), 1);
        assert_eq!(class[UNKNOWN_TAG_VALUE].ways.len(), 2);
    }

    #[rstest]
    fn distance_matches_geodesic_sum(graph: Graph) {
        let reconstruction = reconstruct_route(&[1, 2, 3], &graph.nodes, &graph.ways);
        let distribution = aggregate_tags(&reconstruction, &["surface"]);
        let info = distribution.bucket("surface", "asphalt").expect("asphalt");
        // 0.002 degrees of latitude near 48° N.
        assert!((info.distance - 222.4).abs() < 1.0, "got {}", info.distance);
    }

    #[rstest]
    fn names_default_to_empty(graph: Graph) {
        let reconstruction = reconstruct_route(&[3, 4], &graph.nodes, &graph.ways);
        let distribution = aggregate_tags(&reconstruction, &["surface"]);
        let info = distribution.bucket("surface", "gravel").expect("gravel");
        assert_eq!(info.ways[&2].name, "");
        assert_eq!(info.ways[&2].geometry.coordinates, vec![[11.0, 48.003], [11.0, 48.004]]);
    }

    #[rstest]
    fn duplicate_keys_are_counted_once(graph: Graph) {
        let reconstruction = reconstruct_route(&[1, 2], &graph.nodes, &graph.ways);
        let single = aggregate_tags(&reconstruction, &["surface"]);
        let doubled = aggregate_tags(&reconstruction, &["surface", "surface"]);
        assert_eq!(single, doubled);
    }

    #[rstest]
    fn empty_reconstruction_yields_empty_distribution(graph: Graph) {
        let reconstruction = reconstruct_route(&[1, 5], &graph.nodes, &graph.ways);
        assert!(aggregate_tags(&reconstruction, &["surface"]).is_empty());
    }

    #[rstest]
    fn serialises_as_geojson(graph: Graph) {
        let reconstruction = reconstruct_route(&[1, 2], &graph.nodes, &graph.ways);
        let json = serde_json::to_value(aggregate_tags(&reconstruction, &["surface"]))
            .expect("serialise distribution");
        let way = &json["surface"]["asphalt"]["ways"]["1"];
        assert_eq!(way["name"], "Isarradweg");
        assert_eq!(way["geometry"]["type"], "LineString");
        assert_eq!(way["geometry"]["coordinates"][0][0], 11.0);
    }
}
