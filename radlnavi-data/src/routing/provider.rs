//! HTTP-based `RouteProvider` using OSRM's Route API.
//!
//! The [`RouteProvider`] trait is synchronous to keep the core library
//! embeddable in synchronous contexts. This provider bridges the async HTTP
//! call to the sync interface by blocking on a Tokio runtime internally.
//!
//! # Example
//!
//! ```no_run
//! use geo::Coord;
//! use radlnavi_core::RouteProvider;
//! use radlnavi_data::routing::HttpRouteProvider;
//!
//! let provider = HttpRouteProvider::new("http://localhost:5000")?;
//! let path = provider.route(Coord { x: 11.575, y: 48.137 }, Coord { x: 11.601, y: 48.152 })?;
//! println!("{} nodes along the first leg", path.annotation.nodes.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use geo::Coord;
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use radlnavi_core::{RouteProvider, RoutedPath, RoutingError};

use super::osrm::RouteServiceResponse;

/// Error type for [`HttpRouteProvider`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "radlnavi-routing/0.1";

/// Default OSRM profile segment of the request path.
pub const DEFAULT_PROFILE: &str = "bike";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Query options every route request carries. `annotations=true` is what
/// yields the node ids the analyser needs.
const ROUTE_QUERY: &str =
    "overview=full&alternatives=true&steps=true&geometries=geojson&annotations=true";

/// Configuration for [`HttpRouteProvider`].
#[derive(Debug, Clone)]
pub struct HttpRouteProviderConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Routing profile, `bike` unless the deployment names it differently.
    pub profile: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpRouteProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            profile: DEFAULT_PROFILE.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpRouteProviderConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP-based route provider using the OSRM Route API.
///
/// The provider owns a current-thread Tokio runtime that is reused across
/// calls.
///
/// # Runtime behaviour
///
/// When called from outside any Tokio runtime, the provider uses its own
/// stored runtime. When called from within an existing multi-threaded Tokio
/// runtime (detected via [`Handle::try_current()`] and
/// [`RuntimeFlavor::MultiThread`]), it uses that runtime's handle with
/// [`tokio::task::block_in_place`] to avoid nested runtime panics.
///
/// When called from within a `current_thread` Tokio runtime, the provider
/// falls back to using its own internal runtime. This avoids the panic that
/// `block_in_place` would cause, but may lead to deadlocks if the caller's
/// runtime is driving IO or timers that this request depends on.
pub struct HttpRouteProvider {
    client: Client,
    config: HttpRouteProviderConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpRouteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRouteProvider")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpRouteProvider {
    /// Create a new provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpRouteProviderConfig::new(base_url))
    }

    /// Create a new provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpRouteProviderConfig) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    #[must_use]
    pub fn config(&self) -> &HttpRouteProviderConfig {
        &self.config
    }

    /// Build the OSRM Route API URL between two `lon,lat` coordinates.
    fn build_route_url(&self, start: Coord<f64>, target: Coord<f64>) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?{ROUTE_QUERY}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            start.x,
            start.y,
            target.x,
            target.y
        )
    }

    async fn fetch_route_async(
        &self,
        start: Coord<f64>,
        target: Coord<f64>,
    ) -> Result<RoutedPath, RoutingError> {
        let url = self.build_route_url(start, target);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let route_response: RouteServiceResponse =
            response
                .json()
                .await
                .map_err(|err| RoutingError::ParseError {
                    message: err.to_string(),
                })?;

        route_response.into_routed_path()
    }

    /// Convert a reqwest error to a `RoutingError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> RoutingError {
        if error.is_timeout() {
            return RoutingError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RoutingError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        RoutingError::NetworkError {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl RouteProvider for HttpRouteProvider {
    /// Fetch the best route between `start` and `target`.
    ///
    /// # Runtime requirements
    ///
    /// When called from within an existing Tokio runtime, the runtime must be
    /// multi-threaded (`flavor = "multi_thread"`); see the type-level notes.
    fn route(&self, start: Coord<f64>, target: Coord<f64>) -> Result<RoutedPath, RoutingError> {
        let future = self.fetch_route_async(start, target);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            // No runtime detected, or current_thread runtime: use our own runtime.
            _ => self.runtime.block_on(future),
        }
    }
}
