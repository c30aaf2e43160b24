//! OSRM API response types for the Route service.
//!
//! Only the first route and its first leg are consumed; the annotation, steps
//! and geometry are kept as JSON values so they can be passed through.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use radlnavi_core::{RouteAnnotation, RoutedPath, RoutingError};
use serde::Deserialize;
use serde_json::Value;

/// Code returned when the engine finds no connection between the points.
const NO_ROUTE_CODE: &str = "NoRoute";

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
pub struct RouteServiceResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"NoRoute"` - No route between the coordinates
    /// - `"NoSegment"` - A coordinate could not be snapped to the network
    /// - `"InvalidQuery"` - Invalid query parameters
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Candidate routes, best first.
    #[serde(default)]
    pub routes: Vec<ServiceRoute>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRoute {
    #[serde(default)]
    pub geometry: Value,
    pub duration: f64,
    pub distance: f64,
    #[serde(default)]
    pub legs: Vec<ServiceLeg>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceLeg {
    /// Present when the request asked for `annotations=true`.
    pub annotation: Option<RouteAnnotation>,
    #[serde(default)]
    pub steps: Vec<Value>,
}

impl RouteServiceResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }

    /// Reduce the response to the first route's first leg.
    pub fn into_routed_path(self) -> Result<RoutedPath, RoutingError> {
        if self.code == NO_ROUTE_CODE {
            return Err(RoutingError::NoRoute);
        }
        if !self.is_ok() {
            return Err(RoutingError::ServiceError {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }

        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or(RoutingError::NoRoute)?;
        let leg = route
            .legs
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::ParseError {
                message: "OSRM route has no legs".to_owned(),
            })?;
        let annotation = leg.annotation.ok_or_else(|| RoutingError::ParseError {
            message: "OSRM leg is missing its annotation".to_owned(),
        })?;

        Ok(RoutedPath {
            annotation,
            steps: Value::Array(leg.steps),
            geometry: route.geometry,
            duration: route.duration,
            distance: route.distance,
        })
    }
}
