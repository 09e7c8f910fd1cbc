use crate::client::Transport;
use crate::config::ReketConfig;
use crate::error::ReketError;
use crate::request::{ReketRequest, RequestOptions, RequestTarget};
use crate::response::ReketResponse;
use http::Method;
use serde_json::{Value, json};
use std::sync::Arc;

/// Request dispatcher.
///
/// Resolves the URL prefix, waits for the SSO login when enabled, delegates
/// the call to the configured [`Transport`] and runs the response hooks on
/// the outcome.
#[derive(Debug, Default)]
pub struct Reket {
    config: ReketConfig,
}

impl Reket {
    /// Dispatcher with an empty configuration and no client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_client(client: Arc<dyn Transport>) -> Self {
        let mut config = ReketConfig::new();
        config.set_client(client);
        Self { config }
    }

    #[must_use]
    pub fn from_config(config: ReketConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ReketConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ReketConfig {
        &mut self.config
    }

    /// See [`ReketConfig::request_url_prefix`].
    #[must_use]
    pub fn request_url_prefix(&self, request: &ReketRequest) -> String {
        self.config.request_url_prefix(request)
    }

    /// Dispatch `request`.
    ///
    /// The success hook receives every successful envelope and the error hook
    /// every failure after the SSO policy ran; their return values are what
    /// the caller gets.
    ///
    /// # Errors
    /// - [`ReketError::MissingClient`] if no client is configured
    /// - [`ReketError::InvalidClientContract`] if the transport resolved with
    ///   an error status
    /// - [`ReketError::Transport`] for transport failures
    pub async fn request(&self, mut request: ReketRequest) -> Result<ReketResponse, ReketError> {
        let prefix = self.config.request_url_prefix(&request);
        if !prefix.is_empty() {
            let url = format!("{prefix}{}", request.url());
            request.set_url(url);
        }

        let sso = self.config.sso_auth().cloned();
        if let Some(sso) = &sso {
            sso.login_handshake().wait().await;
        }

        let client = self.config.client().ok_or(ReketError::MissingClient {
            operation: "sending a request",
        })?;

        tracing::debug!(method = %request.method(), url = %request.url(), "dispatching request");

        let result = match client.request(&request).await {
            Ok(response) if response.status().is_client_error() || response.status().is_server_error() => {
                Err(ReketError::InvalidClientContract {
                    reason: format!(
                        "resolved a response with error status {}",
                        response.status()
                    ),
                })
            }
            Ok(response) => Ok(response),
            Err(error) => {
                tracing::debug!(
                    url = %request.url(),
                    status = ?error.status(),
                    error = %error,
                    "request failed"
                );
                let error = match &sso {
                    Some(sso) => sso.apply_failure_policy(&request, error).await,
                    None => error,
                };
                Err(ReketError::Transport(error))
            }
        };

        self.config.hooks().response().apply(result)
    }

    /// # Errors
    /// Same as [`request`](Self::request).
    pub async fn get(
        &self,
        target: impl Into<RequestTarget>,
        options: RequestOptions,
    ) -> Result<ReketResponse, ReketError> {
        self.send(Method::GET, target.into().into_request(options), None)
            .await
    }

    /// # Errors
    /// Same as [`request`](Self::request).
    pub async fn delete(
        &self,
        target: impl Into<RequestTarget>,
        options: RequestOptions,
    ) -> Result<ReketResponse, ReketError> {
        self.send(Method::DELETE, target.into().into_request(options), None)
            .await
    }

    /// Send a `POST`. `data` is used only if the request carries no body yet;
    /// the body defaults to an empty JSON object.
    ///
    /// # Errors
    /// Same as [`request`](Self::request).
    pub async fn post(
        &self,
        target: impl Into<RequestTarget>,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ReketResponse, ReketError> {
        self.send(Method::POST, target.into().into_request(options), Some(data))
            .await
    }

    /// Send a `PUT`. Body handling as in [`post`](Self::post).
    ///
    /// # Errors
    /// Same as [`request`](Self::request).
    pub async fn put(
        &self,
        target: impl Into<RequestTarget>,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ReketResponse, ReketError> {
        self.send(Method::PUT, target.into().into_request(options), Some(data))
            .await
    }

    /// Send a `PATCH`. Body handling as in [`post`](Self::post).
    ///
    /// # Errors
    /// Same as [`request`](Self::request).
    pub async fn patch(
        &self,
        target: impl Into<RequestTarget>,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ReketResponse, ReketError> {
        self.send(Method::PATCH, target.into().into_request(options), Some(data))
            .await
    }

    async fn send(
        &self,
        method: Method,
        mut request: ReketRequest,
        body: Option<Option<Value>>,
    ) -> Result<ReketResponse, ReketError> {
        request.set_method(method);
        if let Some(data) = body
            && request.data().is_none()
        {
            request.set_data(data.unwrap_or_else(|| json!({})));
        }
        self.request(request).await
    }
}
