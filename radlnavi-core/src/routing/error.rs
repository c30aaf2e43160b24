use thiserror::Error;

/// Errors from [`crate::routing::RouteProvider::route`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The request did not complete in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout in whole seconds.
        timeout_secs: u64,
    },
    /// The service answered with a non-success HTTP status.
    #[error("request to {url} failed with HTTP {status}: {message}")]
    HttpError {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Transport-level description.
        message: String,
    },
    /// The service could not be reached.
    #[error("network error while requesting {url}: {message}")]
    NetworkError {
        /// Requested URL.
        url: String,
        /// Transport-level description.
        message: String,
    },
    /// The service answered but reported a failure code.
    #[error("routing service returned {code}: {message}")]
    ServiceError {
        /// Service status code, for example `NoSegment`.
        code: String,
        /// Optional service message.
        message: String,
    },
    /// The response body did not have the expected shape.
    #[error("failed to parse routing response: {message}")]
    ParseError {
        /// Decoder description.
        message: String,
    },
    /// The service found no route between the points.
    #[error("no route found between the requested points")]
    NoRoute,
}
