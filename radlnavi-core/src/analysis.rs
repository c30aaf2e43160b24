//! Request handling: store lookups, reconstruction and aggregation in one
//! place.
//!
//! [`RouteAnalyser`] answers two kinds of request. A tag-distribution request
//! carries the node ids of a route computed elsewhere. A route request asks a
//! [`RouteProvider`] for the route first and then analyses the node ids of its
//! first leg.

use std::collections::HashSet;

use geo::Coord;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_TAG_KEYS, GeoStore, GeoStoreError, NodeId, RouteProvider, RoutedPath,
    TagDistribution, aggregate_tags, reconstruct_route,
};

/// Analyse an already computed route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDistributionRequest {
    /// Route as OSM node ids in travel order.
    pub node_ids: Vec<NodeId>,
    /// Tag keys to bucket by; empty selects [`DEFAULT_TAG_KEYS`].
    #[serde(default)]
    pub tag_keys: Vec<String>,
}

impl TagDistributionRequest {
    /// Request the default tag keys for `node_ids`.
    #[must_use]
    pub fn new(node_ids: Vec<NodeId>) -> Self {
        Self {
            node_ids,
            tag_keys: Vec::new(),
        }
    }

    /// Replace the requested tag keys.
    #[must_use]
    pub fn with_tag_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.tag_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of [`RouteAnalyser::tag_distribution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDistributionResponse {
    pub ok: bool,
    pub tag_distribution: TagDistribution,
}

/// Route between two points, then analyse the result.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    /// `x = longitude`, `y = latitude`.
    pub start: Coord<f64>,
    /// `x = longitude`, `y = latitude`.
    pub target: Coord<f64>,
    /// Tag keys to bucket by; empty selects [`DEFAULT_TAG_KEYS`].
    pub tag_keys: Vec<String>,
}

impl RouteRequest {
    /// Route from `start` to `target` with the default tag keys.
    #[must_use]
    pub fn new(start: Coord<f64>, target: Coord<f64>) -> Self {
        Self {
            start,
            target,
            tag_keys: Vec::new(),
        }
    }

    /// Replace the requested tag keys.
    #[must_use]
    pub fn with_tag_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.tag_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// A routed path together with its tag distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysedRoute {
    pub route: RoutedPath,
    pub tag_distribution: TagDistribution,
}

/// Result of [`RouteAnalyser::route`]; `{"ok": false}` when routing failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub ok: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub analysed: Option<AnalysedRoute>,
}

impl RouteResponse {
    /// Response reporting that no route could be obtained.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            ok: false,
            analysed: None,
        }
    }

    /// Successful response.
    #[must_use]
    pub fn succeeded(route: RoutedPath, tag_distribution: TagDistribution) -> Self {
        Self {
            ok: true,
            analysed: Some(AnalysedRoute {
                route,
                tag_distribution,
            }),
        }
    }
}

/// Serves analysis requests from an injected store.
///
/// The analyser holds no per-request state; share it freely when `S` is
/// `Sync`.
///
/// # Examples
/// ```
/// use radlnavi_core::{MemoryGeoStore, Node, RouteAnalyser, TagDistributionRequest, Way};
///
/// let store = MemoryGeoStore::from_entities(
///     [Node::with_empty_tags(1, 48.0, 11.0), Node::with_empty_tags(2, 48.001, 11.0)],
///     [Way::with_empty_tags(9, vec![1, 2])],
/// );
/// let analyser = RouteAnalyser::new(store);
///
/// let response = analyser.tag_distribution(&TagDistributionRequest::new(vec![1, 2]))?;
/// assert!(response.ok);
/// assert!(response.tag_distribution.bucket("surface", "unknown").is_some());
/// # Ok::<(), radlnavi_core::GeoStoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RouteAnalyser<S> {
    store: S,
}

impl<S: GeoStore> RouteAnalyser<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Tag distribution of the route `node_ids` for `keys`.
    ///
    /// Empty `keys` selects [`DEFAULT_TAG_KEYS`].
    pub fn distribution_for<K: AsRef<str>>(
        &self,
        node_ids: &[NodeId],
        keys: &[K],
    ) -> Result<TagDistribution, GeoStoreError> {
        let ids: HashSet<NodeId> = node_ids.iter().copied().collect();
        let nodes = self.store.nodes_by_id(&ids)?;
        let ways = self.store.ways_touching_nodes(&ids)?;

        let reconstruction = reconstruct_route(node_ids, &nodes, &ways);
        if reconstruction.skipped_edges() > 0 || reconstruction.unmatched_edges() > 0 {
            debug!(
                "route of {} nodes: {} edges skipped for missing nodes, {} edges on no known way",
                node_ids.len(),
                reconstruction.skipped_edges(),
                reconstruction.unmatched_edges()
            );
        }

        let distribution = if keys.is_empty() {
            aggregate_tags(&reconstruction, &DEFAULT_TAG_KEYS)
        } else {
            aggregate_tags(&reconstruction, keys)
        };
        Ok(distribution)
    }

    /// Answer a tag-distribution request.
    ///
    /// # Errors
    ///
    /// Store failures propagate; missing nodes and unmatched edges do not.
    pub fn tag_distribution(
        &self,
        request: &TagDistributionRequest,
    ) -> Result<TagDistributionResponse, GeoStoreError> {
        let tag_distribution = self.distribution_for(&request.node_ids, &request.tag_keys)?;
        Ok(TagDistributionResponse {
            ok: true,
            tag_distribution,
        })
    }

    /// Route with `provider`, then analyse the first leg.
    ///
    /// Any routing failure becomes [`RouteResponse::failed`] and a warning.
    ///
    /// # Errors
    ///
    /// Only store failures are returned as errors.
    pub fn route(
        &self,
        provider: &dyn RouteProvider,
        request: &RouteRequest,
    ) -> Result<RouteResponse, GeoStoreError> {
        let path = match provider.route(request.start, request.target) {
            Ok(path) => path,
            Err(err) => {
                warn!("routing request failed: {err}");
                return Ok(RouteResponse::failed());
            }
        };

        let tag_distribution = self.distribution_for(&path.annotation.nodes, &request.tag_keys)?;
        Ok(RouteResponse::succeeded(path, tag_distribution))
    }
}
