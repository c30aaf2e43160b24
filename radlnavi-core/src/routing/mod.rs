//! Boundary to an external turn-by-turn routing engine.
//!
//! The [`RouteProvider`] trait is synchronous so the analyser stays usable
//! outside an async runtime. Network-backed implementations live in
//! `radlnavi-data`.

mod error;
mod provider;

pub use error::RoutingError;
pub use provider::{RouteAnnotation, RouteProvider, RoutedPath};
