//! Read-only lookups against an ingested geographic store.
//!
//! The [`GeoStore`] trait answers the two questions route analysis needs:
//! which nodes carry a set of ids, and which ways reference any of them.
//! Implementations must never mutate the underlying data, so a single store
//! can serve any number of concurrent requests.

use std::collections::{HashMap, HashSet};

use crate::{Node, NodeId, Way, WayId};

mod error;
mod memory;
#[cfg(feature = "store-sqlite")]
pub mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use error::{EntityKind, GeoStoreError};
pub use memory::MemoryGeoStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteGeoStore, SqliteGeoStoreConfig};

/// Read-only access to persisted nodes and ways.
///
/// Ids that are not present in the store are simply absent from the returned
/// maps; a miss is never an error.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashSet;
/// use radlnavi_core::{GeoStore, MemoryGeoStore, Node, Way};
///
/// let store = MemoryGeoStore::from_entities(
///     [Node::with_empty_tags(1, 48.0, 11.0), Node::with_empty_tags(2, 48.1, 11.1)],
///     [Way::with_empty_tags(10, vec![1, 2])],
/// );
/// let ids = HashSet::from([1, 99]);
///
/// let nodes = store.nodes_by_id(&ids)?;
/// assert!(nodes.contains_key(&1));
/// assert!(!nodes.contains_key(&99));
///
/// let ways = store.ways_touching_nodes(&ids)?;
/// assert_eq!(ways.keys().copied().collect::<Vec<_>>(), vec![10]);
/// # Ok::<(), radlnavi_core::GeoStoreError>(())
/// ```
pub trait GeoStore {
    /// Return every stored node whose id is in `ids`, keyed by id.
    fn nodes_by_id(&self, ids: &HashSet<NodeId>) -> Result<HashMap<NodeId, Node>, GeoStoreError>;

    /// Return every stored way that references at least one node in `ids`,
    /// resolved through the node-to-way index.
    fn ways_touching_nodes(
        &self,
        ids: &HashSet<NodeId>,
    ) -> Result<HashMap<WayId, Way>, GeoStoreError>;
}

impl<S: GeoStore + ?Sized> GeoStore for &S {
    fn nodes_by_id(&self, ids: &HashSet<NodeId>) -> Result<HashMap<NodeId, Node>, GeoStoreError> {
        (**self).nodes_by_id(ids)
    }

    fn ways_touching_nodes(
        &self,
        ids: &HashSet<NodeId>,
    ) -> Result<HashMap<WayId, Way>, GeoStoreError> {
        (**self).ways_touching_nodes(ids)
    }
}

impl<S: GeoStore + ?Sized> GeoStore for std::sync::Arc<S> {
    fn nodes_by_id(&self, ids: &HashSet<NodeId>) -> Result<HashMap<NodeId, Node>, GeoStoreError> {
        (**self).nodes_by_id(ids)
    }

    fn ways_touching_nodes(
        &self,
        ids: &HashSet<NodeId>,
    ) -> Result<HashMap<WayId, Way>, GeoStoreError> {
        (**self).ways_touching_nodes(ids)
    }
}
