use crate::request::ReketRequest;
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Name of the field that holds a scalar payload.
pub(crate) const SCALAR_FIELD: &str = "value";

/// What was actually put on the wire for a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub method: Method,
    pub url: String,
}

/// Call metadata attached to a [`ReketResponse`].
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub config: ReketRequest,
    pub headers: HeaderMap,
    pub request: Option<RequestSummary>,
    pub status: StatusCode,
    pub status_text: String,
}

impl ResponseMeta {
    /// Metadata for `status` answering `config`, with the canonical reason as status text.
    #[must_use]
    pub fn new(config: ReketRequest, status: StatusCode) -> Self {
        Self {
            config,
            headers: HeaderMap::new(),
            request: None,
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
        }
    }
}

/// Normalized envelope around a successful transport response.
///
/// The payload is kept in a named member rather than spread over the
/// envelope:
/// - objects are kept as-is and their fields are reachable with
///   [`field`](Self::field) / [`set_field`](Self::set_field),
/// - arrays are kept as-is (no field access),
/// - scalars (including `null`) are wrapped as `{"value": scalar}`.
///
/// Metadata is read-only. Envelopes are only built through
/// [`new`](Self::new) / [`from_parts`](Self::from_parts), which apply the
/// normalization above.
#[derive(Debug, Clone)]
pub struct ReketResponse {
    data: Value,
    meta: ResponseMeta,
}

impl ReketResponse {
    /// Build an envelope for `data` with `status` and an empty config.
    #[must_use]
    pub fn new(data: Value, status: StatusCode) -> Self {
        Self::from_parts(data, ResponseMeta::new(ReketRequest::new(""), status))
    }

    #[must_use]
    pub fn from_parts(data: Value, meta: ResponseMeta) -> Self {
        Self {
            data: normalize(data),
            meta,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ReketRequest) -> Self {
        self.meta.config = config;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.meta.headers = headers;
        self
    }

    /// Read a payload field. `None` for array payloads and unknown fields.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.as_object()?.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.data.as_object_mut()?.get_mut(name)
    }

    /// Write a payload field. Returns `false` for array payloads.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> bool {
        match self.data.as_object_mut() {
            Some(fields) => {
                fields.insert(name.into(), value);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Deserialize the payload into `T`.
    ///
    /// # Errors
    /// Returns the `serde_json` error if the payload does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }

    #[must_use]
    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    #[must_use]
    pub fn config(&self) -> &ReketRequest {
        &self.meta.config
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.meta.headers
    }

    #[must_use]
    pub fn request(&self) -> Option<&RequestSummary> {
        self.meta.request.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.meta.status
    }

    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.meta.status_text
    }
}

fn normalize(data: Value) -> Value {
    match data {
        Value::Object(_) | Value::Array(_) => data,
        scalar => {
            let mut fields = Map::with_capacity(1);
            fields.insert(SCALAR_FIELD.to_owned(), scalar);
            Value::Object(fields)
        }
    }
}
