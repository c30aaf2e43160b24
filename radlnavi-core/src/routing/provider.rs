//! Route provider trait and the routed path it yields.

use geo::Coord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::NodeId;

use super::error::RoutingError;

/// Per-leg annotation of a routed path.
///
/// Only `nodes` is interpreted; every other annotation array the engine
/// returns is preserved verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteAnnotation {
    /// OSM node ids along the path, in travel order.
    #[serde(default)]
    pub nodes: Vec<NodeId>,
    /// Remaining annotation fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The first route and leg returned by a routing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedPath {
    pub annotation: RouteAnnotation,
    /// Turn-by-turn steps, passed through untouched.
    pub steps: Value,
    /// GeoJSON geometry of the whole route.
    pub geometry: Value,
    /// Seconds.
    pub duration: f64,
    /// Metres.
    pub distance: f64,
}

/// Compute a path between two points.
///
/// Coordinates use `x = longitude`, `y = latitude`.
///
/// # Examples
///
/// ```rust
/// use geo::Coord;
/// use radlnavi_core::{RouteAnnotation, RouteProvider, RoutedPath, RoutingError};
/// use serde_json::Value;
///
/// struct StraightLine;
///
/// impl RouteProvider for StraightLine {
///     fn route(&self, _start: Coord<f64>, _target: Coord<f64>) -> Result<RoutedPath, RoutingError> {
///         Ok(RoutedPath {
///             annotation: RouteAnnotation { nodes: vec![1, 2], ..Default::default() },
///             steps: Value::Array(Vec::new()),
///             geometry: Value::Null,
///             duration: 1.0,
///             distance: 10.0,
///         })
///     }
/// }
///
/// let path = StraightLine.route(Coord { x: 11.5, y: 48.1 }, Coord { x: 11.6, y: 48.2 })?;
/// assert_eq!(path.annotation.nodes, vec![1, 2]);
/// # Ok::<(), RoutingError>(())
/// ```
pub trait RouteProvider {
    /// Route from `start` to `target`.
    fn route(&self, start: Coord<f64>, target: Coord<f64>) -> Result<RoutedPath, RoutingError>;
}

impl<P: RouteProvider + ?Sized> RouteProvider for &P {
    fn route(&self, start: Coord<f64>, target: Coord<f64>) -> Result<RoutedPath, RoutingError> {
        (**self).route(start, target)
    }
}
