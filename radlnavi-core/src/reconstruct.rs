//! Recover which ways a route travelled and in which order.
//!
//! A routing engine reports a route as an ordered list of node ids. Every
//! consecutive pair is an edge; an edge belongs to each stored way in which
//! the two nodes sit next to each other. The nodes a way contributed are
//! gathered into a [`RouteSegment`].

use std::collections::HashMap;

use crate::{Node, NodeId, Way, WayId};

/// The nodes a route traversed along one way.
///
/// A route can leave a way and come back later. A return that starts at the
/// node the previous visit ended on continues the same run; any other return
/// opens a new run whose first index is listed in [`RouteSegment::run_starts`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment<'a> {
    way: &'a Way,
    nodes: Vec<&'a Node>,
    run_starts: Vec<usize>,
}

impl<'a> RouteSegment<'a> {
    fn open(way: &'a Way, a: &'a Node, b: &'a Node) -> Self {
        Self {
            way,
            nodes: vec![a, b],
            run_starts: Vec::new(),
        }
    }

    fn extend(&mut self, a: &'a Node, b: &'a Node) {
        if self.nodes.last().is_some_and(|last| last.id == a.id) {
            self.nodes.push(b);
        } else {
            self.run_starts.push(self.nodes.len());
            self.nodes.push(a);
            self.nodes.push(b);
        }
    }

    /// The stored way this segment lies on.
    #[must_use]
    pub fn way(&self) -> &'a Way {
        self.way
    }

    /// Identifier of the stored way.
    #[must_use]
    pub fn way_id(&self) -> WayId {
        self.way.id
    }

    /// Traversed nodes in route order.
    #[must_use]
    pub fn nodes(&self) -> &[&'a Node] {
        &self.nodes
    }

    /// Traversed node ids in route order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|node| node.id)
    }

    /// Indices into [`RouteSegment::nodes`] where a disjoint re-visit begins.
    #[must_use]
    pub fn run_starts(&self) -> &[usize] {
        &self.run_starts
    }

    /// Consecutive node pairs the route actually moved along, leaving out the
    /// jump between two runs.
    pub fn traversed_pairs(&self) -> impl Iterator<Item = (&'a Node, &'a Node)> + '_ {
        self.nodes
            .windows(2)
            .enumerate()
            .filter(|(index, _)| !self.run_starts.contains(&(index + 1)))
            .filter_map(|(_, pair)| match pair {
                [from, to] => Some((*from, *to)),
                _ => None,
            })
    }

    /// `[lon, lat]` pairs for every node in the segment.
    #[must_use]
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.nodes
            .iter()
            .map(|node| {
                let (lon, lat) = node.coord();
                [lon, lat]
            })
            .collect()
    }
}

/// Segments in order of first encounter, together with data-quality counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction<'a> {
    segments: Vec<RouteSegment<'a>>,
    skipped_edges: usize,
    unmatched_edges: usize,
}

impl<'a> Reconstruction<'a> {
    /// Segments ordered by the route position where each way first appeared.
    #[must_use]
    pub fn segments(&self) -> &[RouteSegment<'a>] {
        &self.segments
    }

    /// Segment for `way_id`, if the route touched that way.
    #[must_use]
    pub fn segment(&self, way_id: WayId) -> Option<&RouteSegment<'a>> {
        self.segments.iter().find(|segment| segment.way_id() == way_id)
    }

    /// Number of distinct ways the route used.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no edge could be attributed to any way.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Edges dropped because an endpoint was not in the node lookup.
    #[must_use]
    pub fn skipped_edges(&self) -> usize {
        self.skipped_edges
    }

    /// Edges dropped because no stored way carries them.
    #[must_use]
    pub fn unmatched_edges(&self) -> usize {
        self.unmatched_edges
    }
}

/// Attribute each edge of `route` to the ways that carry it.
///
/// `nodes` and `ways` should hold the store lookups for every id in the
/// route. Missing nodes and unmatched edges are counted, never raised.
/// Candidate ways are tested in ascending id order.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use radlnavi_core::{Node, Way, reconstruct_route};
///
/// let nodes: HashMap<_, _> = (1..=4)
///     .map(|id| (id, Node::with_empty_tags(id, 48.0 + id as f64 * 1e-3, 11.0)))
///     .collect();
/// let ways = HashMap::from([(7, Way::with_empty_tags(7, vec![1, 2, 3, 4]))]);
///
/// let reconstruction = reconstruct_route(&[1, 2, 3, 2], &nodes, &ways);
/// let segment = reconstruction.segment(7).expect("way 7 used");
/// assert_eq!(segment.node_ids().collect::<Vec<_>>(), vec![1, 2, 3, 2]);
/// ```
#[must_use]
pub fn reconstruct_route<'a>(
    route: &[NodeId],
    nodes: &'a HashMap<NodeId, Node>,
    ways: &'a HashMap<WayId, Way>,
) -> Reconstruction<'a> {
    let candidates = ways_by_node(ways);
    let mut reconstruction = Reconstruction::default();
    let mut positions: HashMap<WayId, usize> = HashMap::new();

    for edge in route.windows(2) {
        let &[a, b] = edge else { continue };
        let (Some(from), Some(to)) = (nodes.get(&a), nodes.get(&b)) else {
            reconstruction.skipped_edges += 1;
            continue;
        };
        if a == b {
            reconstruction.unmatched_edges += 1;
            continue;
        }

        let mut matched = false;
        for way in candidates.get(&a).into_iter().flatten() {
            if !way.connects(a, b) {
                continue;
            }
            matched = true;
            match positions.get(&way.id) {
                Some(&index) => reconstruction.segments[index].extend(from, to),
                None => {
                    positions.insert(way.id, reconstruction.segments.len());
                    reconstruction
                        .segments
                        .push(RouteSegment::open(way, from, to));
                }
            }
        }
        if !matched {
            reconstruction.unmatched_edges += 1;
        }
    }

    reconstruction
}

/// Ways listed under every node they reference, ascending by way id.
fn ways_by_node(ways: &HashMap<WayId, Way>) -> HashMap<NodeId, Vec<&Way>> {
    let mut sorted: Vec<&Way> = ways.values().collect();
    sorted.sort_unstable_by_key(|way| way.id);

    let mut index: HashMap<NodeId, Vec<&Way>> = HashMap::new();
    for way in sorted {
        for node_id in &way.nodes {
            let entry = index.entry(*node_id).or_default();
            if entry.last().is_none_or(|last| last.id != way.id) {
                entry.push(way);
            }
        }
    }
    index
}
