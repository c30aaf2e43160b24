//! Routing-engine adapters.
//!
//! This module provides [`HttpRouteProvider`], an implementation of
//! [`radlnavi_core::RouteProvider`] that asks an OSRM service for a bicycle
//! route annotated with the OSM node ids it passes.
//!
//! # Example
//!
//! ```no_run
//! use radlnavi_data::routing::{HttpRouteProvider, HttpRouteProviderConfig};
//! use std::time::Duration;
//!
//! let config = HttpRouteProviderConfig::new("http://localhost:5000")
//!     .with_profile("bike")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let provider = HttpRouteProvider::with_config(config)?;
//! # Ok::<(), radlnavi_data::routing::ProviderBuildError>(())
//! ```

mod osrm;
mod provider;

#[doc(hidden)]
pub mod test_support;

pub use provider::{
    DEFAULT_PROFILE, DEFAULT_USER_AGENT, HttpRouteProvider, HttpRouteProviderConfig,
    ProviderBuildError,
};
