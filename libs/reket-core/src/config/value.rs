use super::sso_auth::SsoAuthOptions;
use crate::client::Transport;
use crate::error::ReketError;
use crate::request::RequestType;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Names accepted by [`ReketConfig::set_config`](super::ReketConfig::set_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigName {
    Client,
    RequestTypes,
    SsoAuth,
    UrlPrefix,
}

impl ConfigName {
    pub const ALL: [ConfigName; 4] = [
        ConfigName::Client,
        ConfigName::RequestTypes,
        ConfigName::SsoAuth,
        ConfigName::UrlPrefix,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigName::Client => "client",
            ConfigName::RequestTypes => "requestTypes",
            ConfigName::SsoAuth => "ssoAuth",
            ConfigName::UrlPrefix => "urlPrefix",
        }
    }

    /// [`ConfigValue::kind`] of the values this entry accepts.
    #[must_use]
    pub fn expected_kind(self) -> &'static str {
        match self {
            ConfigName::Client => "client",
            ConfigName::RequestTypes => "request types",
            ConfigName::SsoAuth => "sso options",
            ConfigName::UrlPrefix => "url prefix",
        }
    }
}

impl FromStr for ConfigName {
    type Err = ReketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ReketError::UnknownConfigName(s.to_owned()))
    }
}

impl fmt::Display for ConfigName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value passed to [`ReketConfig::set_config`](super::ReketConfig::set_config).
#[derive(Clone)]
pub enum ConfigValue {
    Client(Arc<dyn Transport>),
    RequestTypes(Vec<RequestType>),
    SsoAuth(SsoAuthOptions),
    UrlPrefix(String),
}

impl ConfigValue {
    /// Short description of the value shape, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Client(_) => "client",
            ConfigValue::RequestTypes(_) => "request types",
            ConfigValue::SsoAuth(_) => "sso options",
            ConfigValue::UrlPrefix(_) => "url prefix",
        }
    }
}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Client(_) => f.write_str("Client(..)"),
            ConfigValue::RequestTypes(types) => f.debug_tuple("RequestTypes").field(types).finish(),
            ConfigValue::SsoAuth(options) => f.debug_tuple("SsoAuth").field(options).finish(),
            ConfigValue::UrlPrefix(prefix) => f.debug_tuple("UrlPrefix").field(prefix).finish(),
        }
    }
}

impl From<Vec<RequestType>> for ConfigValue {
    fn from(types: Vec<RequestType>) -> Self {
        ConfigValue::RequestTypes(types)
    }
}

impl From<SsoAuthOptions> for ConfigValue {
    fn from(options: SsoAuthOptions) -> Self {
        ConfigValue::SsoAuth(options)
    }
}

impl From<String> for ConfigValue {
    fn from(prefix: String) -> Self {
        ConfigValue::UrlPrefix(prefix)
    }
}

impl From<&str> for ConfigValue {
    fn from(prefix: &str) -> Self {
        ConfigValue::UrlPrefix(prefix.to_owned())
    }
}
