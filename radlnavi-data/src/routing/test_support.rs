//! Test utilities for routing providers.
//!
//! This module provides [`StubRouteProvider`], a deterministic test double
//! for [`RouteProvider`] that returns pre-configured responses without
//! making actual HTTP requests.

use std::cell::Cell;

use geo::Coord;
use radlnavi_core::{NodeId, RouteAnnotation, RouteProvider, RoutedPath, RoutingError};
use serde_json::{Value, json};

/// Stub `RouteProvider` for testing.
///
/// # Example
///
/// ```
/// use geo::Coord;
/// use radlnavi_core::RouteProvider;
/// use radlnavi_data::routing::test_support::StubRouteProvider;
///
/// let provider = StubRouteProvider::with_nodes(vec![1, 2, 3]);
/// let path = provider.route(Coord { x: 11.5, y: 48.1 }, Coord { x: 11.6, y: 48.2 })?;
/// assert_eq!(path.annotation.nodes, vec![1, 2, 3]);
/// assert_eq!(provider.calls(), 1);
/// # Ok::<(), radlnavi_core::RoutingError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StubRouteProvider {
    response: StubResponse,
    calls: Cell<usize>,
}

#[derive(Debug, Clone)]
enum StubResponse {
    Path(RoutedPath),
    Error(RoutingError),
}

impl StubRouteProvider {
    /// Create a provider that returns the given path for any request.
    #[must_use]
    pub fn with_path(path: RoutedPath) -> Self {
        Self {
            response: StubResponse::Path(path),
            calls: Cell::new(0),
        }
    }

    /// Create a provider whose path visits `nodes`, with empty steps and a
    /// null geometry.
    #[must_use]
    pub fn with_nodes(nodes: Vec<NodeId>) -> Self {
        Self::with_path(RoutedPath {
            annotation: RouteAnnotation {
                nodes,
                ..Default::default()
            },
            steps: json!([]),
            geometry: Value::Null,
            duration: 0.0,
            distance: 0.0,
        })
    }

    /// Create a provider that fails every request with `error`.
    #[must_use]
    pub fn with_error(error: RoutingError) -> Self {
        Self {
            response: StubResponse::Error(error),
            calls: Cell::new(0),
        }
    }

    /// Number of route requests answered so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl RouteProvider for StubRouteProvider {
    fn route(&self, _start: Coord<f64>, _target: Coord<f64>) -> Result<RoutedPath, RoutingError> {
        self.calls.set(self.calls.get() + 1);
        match &self.response {
            StubResponse::Path(path) => Ok(path.clone()),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }
}
