use crate::body::{ResponseBody, decode_payload, read_body_limited};
use crate::builder::HttpTransportBuilder;
use crate::config::{HttpTransportConfig, TransportSecurity};
use crate::error::HttpTransportError;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Request, Response, StatusCode, Uri};
use http_body_util::Full;
use reket_core::{
    Reket, ReketRequest, ReketResponse, RequestSummary, ResponseMeta, Transport, TransportError,
};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tower::Service;
use tower::buffer::Buffer;
use url::Url;

/// Future type of the inner service
pub type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, HttpTransportError>> + Send>>;

/// Buffered tower stack shared by every clone of the transport
pub type BufferedService = Buffer<Request<Full<Bytes>>, ServiceFuture>;

/// [`Transport`] implementation on top of hyper.
///
/// - relative request URLs are appended to the configured base URL
/// - request bodies are sent as JSON
/// - response bodies are parsed as JSON, falling back to text
/// - 2xx answers become a [`ReketResponse`]; every other status becomes a
///   [`TransportError`] carrying status, headers and payload
/// - network, TLS and timeout failures become a [`TransportError`] without status
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    pub(crate) service: BufferedService,
    pub(crate) base_url: Option<Url>,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("max_body_size", &self.max_body_size)
            .field("transport_security", &self.transport_security)
            .finish_non_exhaustive()
    }
}

/// What came back from the server, before it is turned into an envelope.
struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    data: Value,
    summary: RequestSummary,
}

impl HttpTransport {
    /// Transport with the default configuration.
    ///
    /// # Errors
    /// See [`HttpTransportBuilder::build`].
    pub fn new() -> Result<Self, HttpTransportError> {
        HttpTransportBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolve `raw` against the base URL and check its scheme.
    fn resolve_url(&self, raw: &str) -> Result<Uri, HttpTransportError> {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self
                    .base_url
                    .as_ref()
                    .ok_or_else(|| HttpTransportError::InvalidUri {
                        url: raw.to_owned(),
                        reason: "relative URL and no base URL configured".to_owned(),
                    })?;
                let combined = combine_urls(base.as_str(), raw);
                Url::parse(&combined).map_err(|e| HttpTransportError::InvalidUri {
                    url: combined.clone(),
                    reason: e.to_string(),
                })?
            }
            Err(e) => {
                return Err(HttpTransportError::InvalidUri {
                    url: raw.to_owned(),
                    reason: e.to_string(),
                });
            }
        };

        match url.scheme() {
            "https" => {}
            "http" => {
                if self.transport_security == TransportSecurity::TlsOnly {
                    return Err(HttpTransportError::InvalidScheme {
                        scheme: "http".to_owned(),
                        reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                    });
                }
            }
            scheme => {
                return Err(HttpTransportError::InvalidScheme {
                    scheme: scheme.to_owned(),
                    reason: "only http:// and https:// schemes are supported".to_owned(),
                });
            }
        }

        url.as_str()
            .parse()
            .map_err(|e: http::uri::InvalidUri| HttpTransportError::InvalidUri {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    fn build_request(
        &self,
        request: &ReketRequest,
    ) -> Result<Request<Full<Bytes>>, HttpTransportError> {
        let uri = self.resolve_url(request.url())?;

        let mut headers = HeaderMap::new();
        for (name, value) in request.headers() {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        let body = match request.data() {
            Some(data) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                Bytes::from(serde_json::to_vec(data)?)
            }
            None => Bytes::new(),
        };

        let mut http_request = Request::builder()
            .method(request.method().clone())
            .uri(uri)
            .body(Full::new(body))?;
        *http_request.headers_mut() = headers;
        Ok(http_request)
    }

    async fn send(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<Response<ResponseBody>, HttpTransportError> {
        let mut service = self.service.clone();
        try_acquire_buffer_slot(&mut service).await?;
        service.call(request).await.map_err(map_buffer_error)
    }

    async fn execute(&self, request: &ReketRequest) -> Result<RawResponse, HttpTransportError> {
        let http_request = self.build_request(request)?;
        let summary = RequestSummary {
            method: http_request.method().clone(),
            url: http_request.uri().to_string(),
        };
        tracing::debug!(method = %summary.method, url = %summary.url, "sending HTTP request");

        let (parts, body) = self.send(http_request).await?.into_parts();
        let bytes = read_body_limited(body, self.max_body_size).await?;

        Ok(RawResponse {
            status: parts.status,
            headers: parts.headers,
            data: decode_payload(&bytes),
            summary,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: &ReketRequest) -> Result<ReketResponse, TransportError> {
        let outcome = match request.timeout() {
            Some(timeout) => tokio::time::timeout(timeout, self.execute(request))
                .await
                .unwrap_or_else(|_| Err(HttpTransportError::Timeout(timeout))),
            None => self.execute(request).await,
        };

        let raw = outcome.map_err(|err| {
            tracing::debug!(url = %request.url(), error = %err, "HTTP transport failure");
            TransportError::from(err).with_config(request.clone())
        })?;

        if !raw.status.is_success() {
            tracing::debug!(
                url = %raw.summary.url,
                status = %raw.status,
                "HTTP request answered with an error status"
            );
            return Err(TransportError::new(format!(
                "Request failed with status code {}",
                raw.status.as_u16()
            ))
            .with_status(raw.status)
            .with_data(raw.data)
            .with_headers(raw.headers)
            .with_config(request.clone()));
        }

        let mut meta = ResponseMeta::new(request.clone(), raw.status);
        meta.headers = raw.headers;
        meta.request = Some(raw.summary);
        Ok(ReketResponse::from_parts(raw.data, meta))
    }
}

/// Build a [`Reket`] dispatcher sending its requests through a new [`HttpTransport`].
///
/// # Errors
/// See [`HttpTransportBuilder::build`].
pub fn use_http_reket(config: HttpTransportConfig) -> Result<Reket, HttpTransportError> {
    let transport = HttpTransportBuilder::with_config(config).build()?;
    Ok(Reket::with_client(Arc::new(transport)))
}

/// Join `relative` to `base` with exactly one slash between them.
fn combine_urls(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_owned();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Map buffer errors, keeping errors raised by the inner service.
///
/// Anything else means the buffer worker is gone.
fn map_buffer_error(err: tower::BoxError) -> HttpTransportError {
    match err.downcast::<HttpTransportError>() {
        Ok(err) => *err,
        Err(err) => {
            tracing::error!(error = %err, "buffer worker closed unexpectedly; service unavailable");
            HttpTransportError::ServiceClosed
        }
    }
}

/// Fail fast with [`HttpTransportError::Overloaded`] when the request queue is full.
async fn try_acquire_buffer_slot(service: &mut BufferedService) -> Result<(), HttpTransportError> {
    use std::task::Poll;

    let poll_result = std::future::poll_fn(|cx| match service.poll_ready(cx) {
        Poll::Ready(result) => Poll::Ready(Some(result)),
        Poll::Pending => Poll::Ready(None),
    })
    .await;

    match poll_result {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(map_buffer_error(e)),
        None => Err(HttpTransportError::Overloaded),
    }
}
