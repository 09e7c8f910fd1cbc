#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Request dispatch layer for `Reket`
//!
//! This crate coordinates everything that happens around an HTTP call
//! without performing any network I/O itself:
//! - URL prefix resolution (per-request override, request types, global prefix)
//! - Success/error response hooks
//! - An optional single-sign-on gate that holds requests until the login
//!   handshake settles and reacts to 401/403/471 responses
//! - Normalized response and error envelopes
//!
//! The actual HTTP call is delegated to a [`Transport`] implementation
//! (see the `reket-http` crate for a hyper-based one).
//!
//! # Example
//!
//! ```ignore
//! use reket_core::{Reket, RequestOptions, RequestType, SsoAuthOptions};
//! use std::sync::Arc;
//!
//! let mut reket = Reket::with_client(Arc::new(my_transport));
//! reket
//!     .config_mut()
//!     .add_request_types([RequestType::new("v6", "/engine/apiv6")])
//!     .enable_sso_auth(SsoAuthOptions::default())?;
//!
//! let me = reket.get("/me", RequestOptions::default()).await?;
//! println!("{:?}", me.field("nichandle"));
//! ```

mod client;
pub mod config;
mod error;
mod handshake;
mod navigator;
mod reket;
mod request;
mod response;

pub use client::Transport;
pub use config::{
    ConfigHooks, ConfigItem, ConfigName, ConfigValue, ErrorHook, LoginSuccessCallback,
    ReketConfig, ReketHook, ReketSettings, RequestTypes, SsoAuth, SsoAuthOptions,
    SsoAuthSettings, SuccessHook,
};
pub use error::{ReketError, TransportError};
pub use handshake::Handshake;
pub use navigator::{LogNavigator, Navigator, RecordingNavigator};
pub use reket::Reket;
pub use request::{ReketRequest, RequestOptions, RequestTarget, RequestType};
pub use response::{ReketResponse, RequestSummary, ResponseMeta};
