use crate::config::ConfigName;
use crate::request::ReketRequest;
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Normalized failure reported by a [`Transport`](crate::Transport).
///
/// Carries whatever the server answered (status, headers, payload) plus the
/// request that failed. `status` is `None` when no response was received
/// (connection refused, timeout, invalid URL, ...).
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    config: Option<Box<ReketRequest>>,
    data: Option<Value>,
    headers: HeaderMap,
    status: Option<StatusCode>,
    status_text: Option<String>,
}

impl TransportError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            config: None,
            data: None,
            headers: HeaderMap::new(),
            status: None,
            status_text: None,
        }
    }

    /// Set the status and its canonical reason as status text.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self.status_text = status.canonical_reason().map(str::to_owned);
        self
    }

    #[must_use]
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = Some(status_text.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ReketRequest) -> Self {
        self.config = Some(Box::new(config));
        self
    }

    /// Overwrite the status, keeping the status text untouched.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn config(&self) -> Option<&ReketRequest> {
        self.config.as_deref()
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    #[must_use]
    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    /// `message` field of the error payload, if the server sent one.
    #[must_use]
    pub fn payload_message(&self) -> Option<&str> {
        self.data.as_ref()?.get("message")?.as_str()
    }
}

/// Errors returned by the dispatcher and its configuration.
///
/// Configuration and contract violations are returned synchronously by the
/// configuration methods. Transport failures surface as
/// [`ReketError::Transport`] from the async request methods.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReketError {
    /// A value that is not a transport was given as client
    #[error("client must implement the Transport capability, got {found}")]
    InvalidClient { found: &'static str },

    /// An operation needs a configured client
    #[error("a client must be configured before {operation}")]
    MissingClient { operation: &'static str },

    /// `set_config` was given a name outside of the known set
    #[error("'{0}' is not a valid configuration name")]
    UnknownConfigName(String),

    /// `set_config` was given a value of the wrong shape
    #[error("invalid value for '{name}': expected {expected}, got {found}")]
    InvalidConfigValue {
        name: ConfigName,
        expected: &'static str,
        found: &'static str,
    },

    /// The transport resolved with something that is not a success envelope
    #[error("client broke the response contract: {reason}")]
    InvalidClientContract { reason: String },

    /// SSO login was requested outside of a Tokio runtime
    #[error("SSO login needs a running Tokio runtime")]
    NoRuntime,

    /// Failure reported by the transport
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ReketError {
    /// Response status of a transport failure.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.as_transport().and_then(TransportError::status)
    }

    #[must_use]
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            ReketError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transport_error_renders_message() {
        let err = TransportError::new("Request failed with status code 404")
            .with_status(StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Request failed with status code 404");
        assert_eq!(err.status_text(), Some("Not Found"));
    }

    #[test]
    fn test_payload_message() {
        let err = TransportError::new("forbidden")
            .with_status(StatusCode::FORBIDDEN)
            .with_data(json!({"message": "This session is invalid"}));
        assert_eq!(err.payload_message(), Some("This session is invalid"));

        let no_payload = TransportError::new("connection refused");
        assert_eq!(no_payload.payload_message(), None);
        assert_eq!(no_payload.status(), None);
    }

    #[test]
    fn test_set_status_keeps_status_text() {
        let mut err = TransportError::new("forbidden").with_status(StatusCode::FORBIDDEN);
        err.set_status(StatusCode::UNAUTHORIZED);
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.status_text(), Some("Forbidden"));
    }

    #[test]
    fn test_reket_error_exposes_transport_status() {
        let err = ReketError::from(TransportError::new("gone").with_status(StatusCode::GONE));
        assert_eq!(err.status(), Some(StatusCode::GONE));
        assert!(ReketError::NoRuntime.as_transport().is_none());
    }

    #[test]
    fn test_unknown_config_name_renders() {
        let err = ReketError::UnknownConfigName("bogus".into());
        assert_eq!(err.to_string(), "'bogus' is not a valid configuration name");
    }
}
