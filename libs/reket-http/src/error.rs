use reket_core::TransportError;
use std::time::Duration;
use thiserror::Error;

/// HTTP transport error types
///
/// Build-time failures (TLS, user agent, base URL) are returned by
/// [`HttpTransportBuilder::build`](crate::HttpTransportBuilder::build).
/// Per-request failures are converted into a [`TransportError`] without a
/// status before they reach the dispatcher.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpTransportError {
    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// Invalid header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// Request timed out
    #[error("timeout of {}ms exceeded", .0.as_millis())]
    Timeout(Duration),

    /// Transport error (network, connection, etc)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body exceeded size limit
    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// Request body could not be serialized
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Request queue is full
    #[error("Service overloaded: request queue is full")]
    Overloaded,

    /// Internal service failure (buffer worker died, channel closed)
    #[error("Service unavailable: internal failure")]
    ServiceClosed,

    /// Request URL could not be resolved
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri { url: String, reason: String },

    /// Configured base URL is not an absolute URL
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// URL scheme rejected by the transport security configuration
    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme { scheme: String, reason: String },

    /// The transport was built outside of a Tokio runtime
    #[error("HttpTransport must be built inside a Tokio runtime")]
    NoRuntime,
}

impl From<hyper_util::client::legacy::Error> for HttpTransportError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpTransportError::Transport(Box::new(err))
    }
}

impl From<HttpTransportError> for TransportError {
    fn from(err: HttpTransportError) -> Self {
        TransportError::new(err.to_string())
    }
}
