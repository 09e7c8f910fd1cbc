use crate::body::box_response;
use crate::config::{HttpTransportConfig, TlsRootConfig, TransportSecurity};
use crate::default_headers::DefaultHeadersLayer;
use crate::error::HttpTransportError;
use crate::tls;
use crate::transport::{BufferedService, HttpTransport};
use bytes::Bytes;
use http_body_util::Full;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Duration;
use tower::buffer::Buffer;
use tower::timeout::TimeoutLayer;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;
use tower_http::follow_redirect::FollowRedirectLayer;
use url::Url;

/// Builder for an [`HttpTransport`] backed by a hyper client and a tower
/// middleware stack.
#[derive(Debug, Clone, Default)]
pub struct HttpTransportBuilder {
    config: HttpTransportConfig,
}

impl HttpTransportBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: HttpTransportConfig) -> Self {
        Self { config }
    }

    /// Base URL that relative request URLs are appended to
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    /// Allow plain `http://` URLs (local mock servers only)
    #[must_use]
    pub fn allow_insecure_http(mut self) -> Self {
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    #[must_use]
    pub fn tls_roots(mut self, tls_roots: TlsRootConfig) -> Self {
        self.config.tls_roots = tls_roots;
        self
    }

    /// Maximum number of queued requests; clamped to at least 1
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    #[must_use]
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Build the transport.
    ///
    /// Must be called inside a Tokio runtime: the request queue is served by
    /// a background task.
    ///
    /// # Errors
    /// Returns an error if the base URL or user agent is invalid, TLS
    /// initialization fails, or no Tokio runtime is running.
    pub fn build(self) -> Result<HttpTransport, HttpTransportError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(HttpTransportError::NoRuntime);
        }

        if self.config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                "insecure HTTP enabled (TransportSecurity::AllowInsecureHttp); \
                 use only for testing with mock servers"
            );
        }

        let base_url = self
            .config
            .base_url
            .as_deref()
            .map(parse_base_url)
            .transpose()?;

        let timeout = self.config.request_timeout;
        let https = tls::build_https_connector(self.config.tls_roots, self.config.transport)?;

        let mut client_builder = Client::builder(TokioExecutor::new());
        // pool_idle_timeout needs a pool timer to have any effect
        client_builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host)
            .http2_only(false);
        if let Some(idle_timeout) = self.config.pool_idle_timeout {
            client_builder.pool_idle_timeout(idle_timeout);
        }
        let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

        let headers_layer = DefaultHeadersLayer::try_new(&self.config.user_agent)?;

        // Request flow (outer to inner):
        //   Buffer -> ErrorMapping -> Timeout -> DefaultHeaders -> Decompression
        //   -> FollowRedirect -> hyper client
        //
        // Every HTTP status comes back as Ok(Response); only transport,
        // TLS and timeout failures are errors at this level.
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .layer(headers_layer)
            .layer(DecompressionLayer::new())
            .layer(FollowRedirectLayer::new())
            .service(hyper_client)
            .map_response(box_response)
            .map_err(move |e: tower::BoxError| map_tower_error(e, timeout))
            .boxed_clone();

        let service: BufferedService = Buffer::new(service, self.config.buffer_capacity.max(1));

        tracing::debug!(
            base_url = ?base_url.as_ref().map(Url::as_str),
            timeout_ms = timeout.as_millis(),
            "HTTP transport built"
        );

        Ok(HttpTransport {
            service,
            base_url,
            max_body_size: self.config.max_body_size,
            transport_security: self.config.transport,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, HttpTransportError> {
    let url = Url::parse(raw).map_err(|e| HttpTransportError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(HttpTransportError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "URL cannot be used as a base".to_owned(),
        });
    }
    Ok(url)
}

/// Map tower errors, keeping typed errors raised by inner services.
fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpTransportError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpTransportError::Timeout(timeout);
    }

    match err.downcast::<HttpTransportError>() {
        Ok(err) => *err,
        Err(other) => HttpTransportError::Transport(other),
    }
}
