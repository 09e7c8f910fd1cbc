use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Symbolic request type bound to a URL prefix (e.g. `"v6"` -> `"/engine/apiv6"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestType {
    #[serde(rename = "type")]
    request_type: String,
    url_prefix: String,
}

impl RequestType {
    #[must_use]
    pub fn new(request_type: impl Into<String>, url_prefix: impl Into<String>) -> Self {
        Self {
            request_type: request_type.into(),
            url_prefix: url_prefix.into(),
        }
    }

    #[must_use]
    pub fn request_type(&self) -> &str {
        &self.request_type
    }

    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }
}

/// Options accepted by the convenience verbs of [`Reket`](crate::Reket).
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Request type used to pick a registered URL prefix.
    pub request_type: Option<String>,
    /// URL prefix that wins over every configured prefix.
    pub url_prefix: Option<String>,
    /// Do not log out when the request fails with 401.
    pub prevent_logout: bool,
    /// Do not log out when the request fails while the user is not logged in.
    pub no_authenticate: bool,
    /// Per-request timeout, honoured by transports that support it.
    pub timeout: Option<Duration>,
}

/// Description of a single HTTP call.
///
/// Owned by the call that created it. The dispatcher rewrites the URL with
/// the resolved prefix before handing it to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ReketRequest {
    url: String,
    method: Method,
    headers: BTreeMap<String, String>,
    data: Option<Value>,
    request_type: Option<String>,
    url_prefix: Option<String>,
    prevent_logout: bool,
    no_authenticate: bool,
    timeout: Option<Duration>,
}

impl ReketRequest {
    /// Create a `GET` request for `url` with no headers and no body.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: BTreeMap::new(),
            data: None,
            request_type: None,
            url_prefix: None,
            prevent_logout: false,
            no_authenticate: false,
            timeout: None,
        }
    }

    /// Apply an option bag on top of the current request.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        for (name, value) in options.headers {
            self.headers.insert(name, value);
        }
        if options.request_type.is_some() {
            self.request_type = options.request_type;
        }
        if options.url_prefix.is_some() {
            self.url_prefix = options.url_prefix;
        }
        self.prevent_logout |= options.prevent_logout;
        self.no_authenticate |= options.no_authenticate;
        if options.timeout.is_some() {
            self.timeout = options.timeout;
        }
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_header(name, value);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_request_type(mut self, request_type: impl Into<String>) -> Self {
        self.request_type = Some(request_type.into());
        self
    }

    #[must_use]
    pub fn with_url_prefix(mut self, url_prefix: impl Into<String>) -> Self {
        self.url_prefix = Some(url_prefix.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keep the session when this request fails with 401.
    #[must_use]
    pub fn prevent_logout(mut self) -> Self {
        self.prevent_logout = true;
        self
    }

    /// Keep the session when this request fails for a user that is not logged in.
    #[must_use]
    pub fn no_authenticate(mut self) -> Self {
        self.no_authenticate = true;
        self
    }

    /// Add or replace a header.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn set_data(&mut self, data: Value) -> &mut Self {
        self.data = Some(data);
        self
    }

    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    pub(crate) fn set_url(&mut self, url: String) {
        self.url = url;
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn request_type(&self) -> Option<&str> {
        self.request_type.as_deref()
    }

    #[must_use]
    pub fn url_prefix(&self) -> Option<&str> {
        self.url_prefix.as_deref()
    }

    #[must_use]
    pub fn is_logout_prevented(&self) -> bool {
        self.prevent_logout
    }

    #[must_use]
    pub fn is_authentication_skipped(&self) -> bool {
        self.no_authenticate
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Either a bare URL or a fully built request.
///
/// Options passed to the convenience verbs only apply to bare URLs; a ready
/// request is used as-is.
#[derive(Debug, Clone)]
pub enum RequestTarget {
    Url(String),
    Request(ReketRequest),
}

impl RequestTarget {
    #[must_use]
    pub fn into_request(self, options: RequestOptions) -> ReketRequest {
        match self {
            RequestTarget::Url(url) => ReketRequest::new(url).with_options(options),
            RequestTarget::Request(request) => request,
        }
    }
}

impl From<&str> for RequestTarget {
    fn from(url: &str) -> Self {
        RequestTarget::Url(url.to_owned())
    }
}

impl From<String> for RequestTarget {
    fn from(url: String) -> Self {
        RequestTarget::Url(url)
    }
}

impl From<ReketRequest> for RequestTarget {
    fn from(request: ReketRequest) -> Self {
        RequestTarget::Request(request)
    }
}
