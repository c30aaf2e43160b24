use serde::{Deserialize, Serialize};

use crate::{NodeId, Tags, WayId};

/// An OpenStreetMap way: an ordered list of node references.
///
/// The node list may contain repeats (closed ways start and end on the same
/// node) and may reference nodes absent from the store.
///
/// # Examples
/// ```
/// use radlnavi_core::Way;
///
/// let way = Way::with_empty_tags(10, vec![1, 2, 3]);
/// assert!(way.connects(2, 3));
/// assert!(way.connects(3, 2));
/// assert!(!way.connects(1, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Way {
    pub id: WayId,
    pub nodes: Vec<NodeId>,
    #[serde(default)]
    pub tags: Tags,
}

impl Way {
    /// Construct a `Way` with the provided tags.
    pub fn new(id: WayId, nodes: Vec<NodeId>, tags: Tags) -> Self {
        Self { id, nodes, tags }
    }

    /// Construct a `Way` without tags.
    pub fn with_empty_tags(id: WayId, nodes: Vec<NodeId>) -> Self {
        Self::new(id, nodes, Tags::new())
    }

    /// Whether `a` and `b` sit next to each other anywhere in the node list,
    /// in either order.
    #[must_use]
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        self.nodes.windows(2).any(|pair| match pair {
            [first, second] => (*first == a && *second == b) || (*first == b && *second == a),
            _ => false,
        })
    }

    /// Look up a tag value.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}
