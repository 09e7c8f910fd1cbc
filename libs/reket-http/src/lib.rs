#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! hyper-based [`Transport`](reket_core::Transport) for `Reket`
//!
//! This crate provides an HTTP transport with:
//! - Automatic TLS via rustls (HTTPS only by default)
//! - Connection pooling
//! - Configurable timeouts, per transport and per request
//! - Default `User-Agent` and `Accept` headers
//! - Transparent response decompression (gzip, brotli, deflate)
//! - Base URL resolution for relative request URLs
//!
//! Successful (2xx) answers resolve with a [`ReketResponse`](reket_core::ReketResponse);
//! every other status and every network failure is reported as a
//! [`TransportError`](reket_core::TransportError).
//!
//! # Example
//!
//! ```ignore
//! use reket_http::{HttpTransportConfig, use_http_reket};
//! use reket_core::RequestOptions;
//!
//! let reket = use_http_reket(HttpTransportConfig {
//!     base_url: Some("https://eu.api.example.com".to_owned()),
//!     ..HttpTransportConfig::default()
//! })?;
//!
//! let me = reket.get("/me", RequestOptions::default()).await?;
//! ```

mod body;
mod builder;
mod config;
mod default_headers;
mod error;
mod tls;
mod transport;

pub use body::ResponseBody;
pub use builder::HttpTransportBuilder;
pub use config::{
    DEFAULT_ACCEPT, DEFAULT_USER_AGENT, HttpTransportConfig, TlsRootConfig, TransportSecurity,
};
pub use error::HttpTransportError;
pub use transport::{BufferedService, HttpTransport, ServiceFuture, use_http_reket};
pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
