//! Fully in-memory store, built once and shared between readers.

use std::collections::{HashMap, HashSet};

use crate::{Node, NodeId, Way, WayId};

use super::{GeoStore, GeoStoreError};

/// `GeoStore` backed by hash maps.
///
/// The store is assembled up front and exposes no mutation afterwards, so it
/// is `Send + Sync` and can sit behind an `Arc` for concurrent readers.
#[derive(Debug, Clone, Default)]
pub struct MemoryGeoStore {
    nodes: HashMap<NodeId, Node>,
    ways: HashMap<WayId, Way>,
    node_to_ways: HashMap<NodeId, Vec<WayId>>,
}

impl MemoryGeoStore {
    /// Build a store from nodes and ways, deriving the node-to-way index.
    ///
    /// Later entities replace earlier ones sharing the same id.
    pub fn from_entities<N, W>(nodes: N, ways: W) -> Self
    where
        N: IntoIterator<Item = Node>,
        W: IntoIterator<Item = Way>,
    {
        let nodes: HashMap<NodeId, Node> = nodes.into_iter().map(|node| (node.id, node)).collect();
        let ways: HashMap<WayId, Way> = ways.into_iter().map(|way| (way.id, way)).collect();

        let mut node_to_ways: HashMap<NodeId, Vec<WayId>> = HashMap::new();
        for way in ways.values() {
            for node_id in &way.nodes {
                node_to_ways.entry(*node_id).or_default().push(way.id);
            }
        }

        Self {
            nodes,
            ways,
            node_to_ways,
        }
    }

    /// Number of stored nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored ways.
    #[must_use]
    pub fn way_count(&self) -> usize {
        self.ways.len()
    }
}

impl GeoStore for MemoryGeoStore {
    fn nodes_by_id(&self, ids: &HashSet<NodeId>) -> Result<HashMap<NodeId, Node>, GeoStoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|node| (node.id, node.clone()))
            .collect())
    }

    fn ways_touching_nodes(
        &self,
        ids: &HashSet<NodeId>,
    ) -> Result<HashMap<WayId, Way>, GeoStoreError> {
        let mut found = HashMap::new();
        for way_id in ids
            .iter()
            .filter_map(|id| self.node_to_ways.get(id))
            .flatten()
        {
            if found.contains_key(way_id) {
                continue;
            }
            if let Some(way) = self.ways.get(way_id) {
                found.insert(*way_id, way.clone());
            }
        }
        Ok(found)
    }
}
