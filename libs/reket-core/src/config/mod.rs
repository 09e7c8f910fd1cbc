//! Dispatcher configuration: client, URL prefixes, hooks and SSO.

mod hooks;
mod item;
mod request_types;
mod settings;
mod sso_auth;
mod value;

pub use hooks::{ConfigHooks, ErrorHook, ReketHook, SuccessHook};
pub use item::ConfigItem;
pub use request_types::RequestTypes;
pub use settings::{ReketSettings, SsoAuthSettings};
pub use sso_auth::{
    DEFAULT_LOGIN_URL, DEFAULT_LOGOUT_URL, DEFAULT_USER_URL, LOGIN_HEADERS, LoginSuccessCallback,
    STATUS_LOGIN_REQUIRED, SsoAuth, SsoAuthOptions,
};
pub use value::{ConfigName, ConfigValue};

use crate::client::Transport;
use crate::error::ReketError;
use crate::request::{ReketRequest, RequestType};
use std::sync::Arc;

/// Configuration owned by a [`Reket`](crate::Reket) dispatcher.
#[derive(Debug, Default)]
pub struct ReketConfig {
    client: ConfigItem<ClientSlot>,
    url_prefix: ConfigItem<String>,
    hooks: ConfigHooks,
    request_types: RequestTypes,
    sso_auth: Option<SsoAuth>,
}

/// `Debug` wrapper for the transport slot.
#[derive(Clone)]
struct ClientSlot(Arc<dyn Transport>);

impl std::fmt::Debug for ClientSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Transport(..)")
    }
}

impl ReketConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn client(&self) -> Option<Arc<dyn Transport>> {
        self.client.value().map(|slot| Arc::clone(&slot.0))
    }

    /// Set the transport used for every request, including the SSO login.
    pub fn set_client(&mut self, client: Arc<dyn Transport>) -> &mut Self {
        self.client.set(ClientSlot(client));
        self
    }

    /// Global URL prefix, used when no request type applies.
    #[must_use]
    pub fn url_prefix(&self) -> Option<&str> {
        self.url_prefix.value().map(String::as_str)
    }

    pub fn set_url_prefix(&mut self, url_prefix: impl Into<String>) -> &mut Self {
        self.url_prefix.set(url_prefix.into());
        self
    }

    #[must_use]
    pub fn hooks(&self) -> &ConfigHooks {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut ConfigHooks {
        &mut self.hooks
    }

    #[must_use]
    pub fn request_types(&self) -> &RequestTypes {
        &self.request_types
    }

    pub fn request_types_mut(&mut self) -> &mut RequestTypes {
        &mut self.request_types
    }

    pub fn add_request_type(
        &mut self,
        request_type: impl Into<String>,
        url_prefix: impl Into<String>,
    ) -> &mut Self {
        self.request_types.add(request_type, url_prefix);
        self
    }

    pub fn add_request_types(
        &mut self,
        request_types: impl IntoIterator<Item = RequestType>,
    ) -> &mut Self {
        self.request_types.add_all(request_types);
        self
    }

    #[must_use]
    pub fn request_type(&self, request_type: &str) -> Option<&RequestType> {
        self.request_types.get(request_type)
    }

    #[must_use]
    pub fn sso_auth(&self) -> Option<&SsoAuth> {
        self.sso_auth.as_ref()
    }

    pub fn sso_auth_mut(&mut self) -> Option<&mut SsoAuth> {
        self.sso_auth.as_mut()
    }

    #[must_use]
    pub fn is_sso_auth_enabled(&self) -> bool {
        self.sso_auth.is_some()
    }

    /// Enable the SSO gate and start its login in the background.
    ///
    /// Requests issued afterwards wait for the login handshake.
    ///
    /// # Errors
    /// - [`ReketError::MissingClient`] if no client is configured yet
    /// - [`ReketError::NoRuntime`] when called outside of a Tokio runtime
    pub fn enable_sso_auth(&mut self, options: SsoAuthOptions) -> Result<&mut Self, ReketError> {
        let client = self.client().ok_or(ReketError::MissingClient {
            operation: "enabling SSO auth",
        })?;

        let sso = SsoAuth::new(options);
        sso.spawn_login(client)?;
        tracing::debug!(user_url = %sso.user_url(), "SSO auth enabled");
        self.sso_auth = Some(sso);
        Ok(self)
    }

    /// Remove the SSO gate. Requests no longer wait for a login.
    pub fn disable_sso_auth(&mut self) -> Option<SsoAuth> {
        self.sso_auth.take()
    }

    /// Set a configuration entry by name.
    ///
    /// # Errors
    /// - [`ReketError::UnknownConfigName`] if `name` is not one of
    ///   `client`, `requestTypes`, `ssoAuth`, `urlPrefix`
    /// - [`ReketError::InvalidClient`] if `client` is given something else than a transport
    /// - [`ReketError::InvalidConfigValue`] for other shape mismatches
    /// - errors of [`enable_sso_auth`](Self::enable_sso_auth) for `ssoAuth`
    pub fn set_config(&mut self, name: &str, value: ConfigValue) -> Result<&mut Self, ReketError> {
        let name: ConfigName = name.parse()?;
        match (name, value) {
            (ConfigName::Client, ConfigValue::Client(client)) => Ok(self.set_client(client)),
            (ConfigName::Client, other) => Err(ReketError::InvalidClient {
                found: other.kind(),
            }),
            (ConfigName::RequestTypes, ConfigValue::RequestTypes(types)) => {
                Ok(self.add_request_types(types))
            }
            (ConfigName::SsoAuth, ConfigValue::SsoAuth(options)) => self.enable_sso_auth(options),
            (ConfigName::UrlPrefix, ConfigValue::UrlPrefix(prefix)) => {
                Ok(self.set_url_prefix(prefix))
            }
            (name, other) => Err(ReketError::InvalidConfigValue {
                name,
                expected: name.expected_kind(),
                found: other.kind(),
            }),
        }
    }

    /// Apply serialized settings on top of the current configuration.
    ///
    /// # Errors
    /// Same as [`enable_sso_auth`](Self::enable_sso_auth) when `sso_auth` is set.
    pub fn apply_settings(&mut self, settings: ReketSettings) -> Result<&mut Self, ReketError> {
        if let Some(url_prefix) = settings.url_prefix {
            self.set_url_prefix(url_prefix);
        }
        self.add_request_types(settings.request_types);
        if let Some(sso_auth) = settings.sso_auth {
            self.enable_sso_auth(sso_auth.into())?;
        }
        Ok(self)
    }

    /// Resolve the URL prefix for `request`.
    ///
    /// In order: the request's own prefix, the global prefix when no request
    /// type is registered, the prefix of the request's type (global prefix if
    /// the type is unknown), then the first registered type's prefix.
    #[must_use]
    pub fn request_url_prefix(&self, request: &ReketRequest) -> String {
        if let Some(prefix) = request.url_prefix() {
            return prefix.to_owned();
        }

        let global = || self.url_prefix().unwrap_or_default().to_owned();

        if self.request_types.is_empty() {
            return global();
        }

        if let Some(request_type) = request.request_type() {
            return self
                .request_types
                .url_prefix(request_type)
                .map_or_else(global, str::to_owned);
        }

        self.request_types
            .default_url_prefix()
            .unwrap_or_default()
            .to_owned()
    }
}
