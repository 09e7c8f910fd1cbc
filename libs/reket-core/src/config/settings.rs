use super::sso_auth::SsoAuthOptions;
use crate::request::RequestType;
use serde::{Deserialize, Serialize};

/// Serializable subset of the dispatcher configuration.
///
/// Lets a host keep reket settings in its own config files; the client and
/// callbacks are still set programmatically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ReketSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_prefix: Option<String>,
    pub request_types: Vec<RequestType>,
    /// Enables the SSO gate when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_auth: Option<SsoAuthSettings>,
}

/// URLs of the SSO gate. Omitted URLs use the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SsoAuthSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_url: Option<String>,
}

impl From<SsoAuthSettings> for SsoAuthOptions {
    fn from(settings: SsoAuthSettings) -> Self {
        SsoAuthOptions {
            login_url: settings.login_url,
            logout_url: settings.logout_url,
            user_url: settings.user_url,
            ..SsoAuthOptions::default()
        }
    }
}
