use std::time::Duration;

/// Default User-Agent string for HTTP requests
pub const DEFAULT_USER_AGENT: &str = concat!("reket-http/", env!("CARGO_PKG_VERSION"));

/// `Accept` header sent when the request does not set one
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// TLS root certificate configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TlsRootConfig {
    /// Use Mozilla's root certificates (webpki-roots, no OS dependency)
    #[default]
    WebPki,
    /// Use OS native root certificate store
    Native,
}

/// Transport security configuration
///
/// Controls whether the transport enforces TLS or allows insecure HTTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// Require TLS for all connections (HTTPS only)
    #[default]
    TlsOnly,
    /// Allow insecure HTTP connections (local mock servers only)
    AllowInsecureHttp,
}

/// Configuration of an [`HttpTransport`](crate::HttpTransport)
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL that relative request URLs are appended to (default: none)
    ///
    /// With `https://api.example.com/1.0` as base, `/me` is sent to
    /// `https://api.example.com/1.0/me`. Absolute request URLs are sent as-is.
    pub base_url: Option<String>,

    /// Per-request timeout (default: 30 seconds)
    ///
    /// A timeout set on the request itself wins when it is shorter.
    pub request_timeout: Duration,

    /// Maximum response body size in bytes (default: 10 MB)
    pub max_body_size: usize,

    /// User-Agent header value
    pub user_agent: String,

    /// Transport security mode (default: `TlsOnly`)
    pub transport: TransportSecurity,

    /// TLS root certificate strategy (default: `WebPki`)
    pub tls_roots: TlsRootConfig,

    /// Maximum number of requests queued for the connection pool (default: 1024)
    pub buffer_capacity: usize,

    /// Timeout for idle pooled connections (default: 90 seconds)
    ///
    /// `None` keeps hyper-util's default.
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum number of idle connections per host (default: 32)
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10 MB
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
            tls_roots: TlsRootConfig::default(),
            buffer_capacity: 1024,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }
}

impl HttpTransportConfig {
    /// Configuration for local mock servers (allows insecure HTTP)
    ///
    /// **WARNING**: never use in production, plain HTTP exposes traffic to interception.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_body_size: 1024 * 1024, // 1 MB
            transport: TransportSecurity::AllowInsecureHttp,
            buffer_capacity: 256,
            pool_idle_timeout: Some(Duration::from_secs(10)),
            pool_max_idle_per_host: 4,
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.base_url, None);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_body_size, 10 * 1024 * 1024);
        assert_eq!(config.transport, TransportSecurity::TlsOnly);
        assert_eq!(config.tls_roots, TlsRootConfig::WebPki);
        assert!(config.user_agent.starts_with("reket-http/"));
    }

    #[test]
    fn test_testing_config_allows_http() {
        let config = HttpTransportConfig::for_testing();
        assert_eq!(config.transport, TransportSecurity::AllowInsecureHttp);
        assert_eq!(config.buffer_capacity, 256);
    }
}
