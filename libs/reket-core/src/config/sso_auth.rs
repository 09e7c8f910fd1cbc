use crate::client::Transport;
use crate::error::{ReketError, TransportError};
use crate::handshake::Handshake;
use crate::navigator::{LogNavigator, Navigator};
use crate::request::ReketRequest;
use http::{Method, StatusCode};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

pub const DEFAULT_LOGIN_URL: &str = "/auth";
pub const DEFAULT_LOGOUT_URL: &str = "/auth?action=disconnect";
pub const DEFAULT_USER_URL: &str = "/engine/api/me";

/// Headers sent with the login (user lookup) request.
pub const LOGIN_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", "application/json;charset=utf-8"),
    ("Accept", "application/json"),
];

const ONSUCCESS_PARAM: &str = "onsuccess";
const FROM_PARAM: &str = "from";

/// Non-standard status asking the client to go through the login page again.
pub const STATUS_LOGIN_REQUIRED: u16 = 471;

/// Payload messages of a 403 that actually mean "session expired".
const EXPIRED_SESSION_MESSAGES: [&str; 2] =
    ["This session is forbidden", "This session is invalid"];

/// Called with the user payload once the login request succeeded.
pub type LoginSuccessCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Options accepted by [`ReketConfig::enable_sso_auth`](crate::ReketConfig::enable_sso_auth).
///
/// Every URL falls back to its `DEFAULT_*` constant when omitted.
#[derive(Clone, Default)]
pub struct SsoAuthOptions {
    pub login_url: Option<String>,
    pub logout_url: Option<String>,
    pub user_url: Option<String>,
    pub on_login_success: Option<LoginSuccessCallback>,
    /// Defaults to a [`LogNavigator`].
    pub navigator: Option<Arc<dyn Navigator>>,
}

impl fmt::Debug for SsoAuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsoAuthOptions")
            .field("login_url", &self.login_url)
            .field("logout_url", &self.logout_url)
            .field("user_url", &self.user_url)
            .field("on_login_success", &self.on_login_success.is_some())
            .field("navigator", &self.navigator.is_some())
            .finish()
    }
}

/// URLs and callback of the gate; setters on any clone apply to all of them.
struct SsoEndpoints {
    login_url: String,
    logout_url: String,
    user_url: String,
    on_login_success: Option<LoginSuccessCallback>,
}

/// Mutable session state shared by every clone of an [`SsoAuth`].
struct SsoState {
    endpoints: RwLock<SsoEndpoints>,
    is_logged: AtomicBool,
    user: RwLock<Option<Value>>,
    login: Mutex<Handshake<Option<Value>>>,
    // Lock order: login_page before logout_page.
    login_page: Mutex<Option<Handshake<()>>>,
    logout_page: Mutex<Option<Handshake<()>>>,
}

impl SsoState {
    fn new(endpoints: SsoEndpoints) -> Self {
        Self {
            endpoints: RwLock::new(endpoints),
            is_logged: AtomicBool::new(false),
            user: RwLock::new(None),
            login: Mutex::new(Handshake::new()),
            login_page: Mutex::new(None),
            logout_page: Mutex::new(None),
        }
    }
}

/// Single-sign-on gate.
///
/// Holds requests until the login handshake settles, tracks whether the
/// user is logged in, and sends the user to the login/logout pages through
/// a [`Navigator`].
///
/// States:
/// - pending: the login handshake is unresolved
/// - logged: the user lookup succeeded, the handshake resolved with the user
/// - not logged: the user lookup failed, a login-page redirect was issued and
///   the handshake resolved with `None`
/// - logged out: [`logout`](Self::logout) was called
///
/// At most one login-page and one logout-page redirect are issued per
/// instance; a logout is suppressed while a login redirect is pending.
#[derive(Clone)]
pub struct SsoAuth {
    navigator: Arc<dyn Navigator>,
    state: Arc<SsoState>,
}

impl fmt::Debug for SsoAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let endpoints = self.state.endpoints.read();
        f.debug_struct("SsoAuth")
            .field("login_url", &endpoints.login_url)
            .field("logout_url", &endpoints.logout_url)
            .field("user_url", &endpoints.user_url)
            .field("is_logged", &self.state.is_logged.load(Ordering::Acquire))
            .field("login_settled", &self.state.login.lock().is_settled())
            .finish_non_exhaustive()
    }
}

impl Default for SsoAuth {
    fn default() -> Self {
        Self::new(SsoAuthOptions::default())
    }
}

impl SsoAuth {
    #[must_use]
    pub fn new(options: SsoAuthOptions) -> Self {
        let endpoints = SsoEndpoints {
            login_url: options
                .login_url
                .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_owned()),
            logout_url: options
                .logout_url
                .unwrap_or_else(|| DEFAULT_LOGOUT_URL.to_owned()),
            user_url: options
                .user_url
                .unwrap_or_else(|| DEFAULT_USER_URL.to_owned()),
            on_login_success: options.on_login_success,
        };
        Self {
            navigator: options
                .navigator
                .unwrap_or_else(|| Arc::new(LogNavigator::default())),
            state: Arc::new(SsoState::new(endpoints)),
        }
    }

    pub fn set_login_url(&mut self, login_url: impl Into<String>) -> &mut Self {
        self.state.endpoints.write().login_url = login_url.into();
        self
    }

    pub fn set_logout_url(&mut self, logout_url: impl Into<String>) -> &mut Self {
        self.state.endpoints.write().logout_url = logout_url.into();
        self
    }

    pub fn set_user_url(&mut self, user_url: impl Into<String>) -> &mut Self {
        self.state.endpoints.write().user_url = user_url.into();
        self
    }

    pub fn set_on_login_success(
        &mut self,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> &mut Self {
        self.state.endpoints.write().on_login_success = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn login_url(&self) -> String {
        self.state.endpoints.read().login_url.clone()
    }

    #[must_use]
    pub fn logout_url(&self) -> String {
        self.state.endpoints.read().logout_url.clone()
    }

    #[must_use]
    pub fn user_url(&self) -> String {
        self.state.endpoints.read().user_url.clone()
    }

    #[must_use]
    pub fn on_login_success(&self) -> Option<LoginSuccessCallback> {
        self.state.endpoints.read().on_login_success.clone()
    }

    /// The current login handshake; resolves with the user (or `None`) once
    /// the login request settled.
    #[must_use]
    pub fn login_handshake(&self) -> Handshake<Option<Value>> {
        self.state.login.lock().clone()
    }

    /// User payload returned by the last successful login.
    #[must_use]
    pub fn user(&self) -> Option<Value> {
        self.state.user.read().clone()
    }

    /// Wait for the login handshake, then report whether the user is logged in.
    pub async fn is_logged(&self) -> bool {
        self.login_handshake().wait().await;
        self.state.is_logged.load(Ordering::Acquire)
    }

    /// Look the user up through `client` and settle the login handshake.
    ///
    /// On success the user payload is stored and `on_login_success` is
    /// called. On any failure the user is considered logged out and sent to
    /// the login page. The handshake resolves in both cases.
    ///
    /// Calling `login` again after the handshake settled starts a new one.
    /// Concurrent calls are not coordinated.
    pub async fn login(&self, client: Arc<dyn Transport>) -> Option<Value> {
        let handshake = self.fresh_login_handshake();

        let user_url = self.user_url();
        let mut request = ReketRequest::new(user_url.clone()).with_method(Method::GET);
        for (name, value) in LOGIN_HEADERS {
            request.add_header(name, value);
        }

        match client.request(&request).await {
            Ok(response) => {
                let user = response.into_data();
                *self.state.user.write() = Some(user.clone());
                self.state.is_logged.store(true, Ordering::Release);
                tracing::info!(user_url = %user_url, "SSO login succeeded");

                // Read after the lookup: a callback set meanwhile applies.
                if let Some(callback) = self.on_login_success() {
                    callback(&user);
                }
            }
            Err(err) => {
                *self.state.user.write() = None;
                self.state.is_logged.store(false, Ordering::Release);
                tracing::info!(
                    user_url = %user_url,
                    status = ?err.status(),
                    error = %err,
                    "SSO login failed, redirecting to login page"
                );
                self.redirect_to_login(None);
            }
        }

        let user = self.user();
        handshake.resolve(user.clone());
        user
    }

    /// Run [`login`](Self::login) in the background on the current Tokio runtime.
    ///
    /// # Errors
    /// Returns [`ReketError::NoRuntime`] when called outside of a Tokio runtime.
    pub fn spawn_login(
        &self,
        client: Arc<dyn Transport>,
    ) -> Result<JoinHandle<Option<Value>>, ReketError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ReketError::NoRuntime)?;
        // Install the handshake before returning so requests issued right
        // after this call wait for this login.
        self.fresh_login_handshake();
        let sso = self.clone();
        Ok(runtime.spawn(async move { sso.login(client).await }))
    }

    /// Send the user to the login page.
    ///
    /// Appends `onsuccess=<success_url or current page>` unless the login URL
    /// already carries one. Only the first call redirects; every call returns
    /// the same pending handshake, which never resolves while the page stays.
    pub fn redirect_to_login(&self, success_url: Option<&str>) -> Handshake<()> {
        let pending = {
            let mut login_page = self.state.login_page.lock();
            if let Some(pending) = login_page.as_ref() {
                return pending.clone();
            }
            let pending = Handshake::new();
            *login_page = Some(pending.clone());
            pending
        };

        let login_url = self.login_url();
        let mut params = Vec::new();
        if !login_url.contains(ONSUCCESS_PARAM) {
            params.push(self.onsuccess_param(success_url));
        }

        // No lock is held here: the navigator may call back into this gate.
        let url = build_url(&login_url, &params);
        tracing::info!(url = %url, "redirecting to SSO login page");
        self.navigator.redirect_to(&url);
        pending
    }

    /// Log the user out by sending them to the logout page.
    pub fn logout(&self, success_url: Option<&str>) -> Handshake<()> {
        self.redirect_to_logout_page(success_url)
    }

    /// Send the user to the logout page.
    ///
    /// Suppressed while a login-page or logout-page redirect is pending; in
    /// that case the pending handshake is returned. Appends `onsuccess` and,
    /// when a referrer is known, `from` unless the logout URL already has them.
    pub fn redirect_to_logout_page(&self, success_url: Option<&str>) -> Handshake<()> {
        let pending = {
            let login_page = self.state.login_page.lock();
            if let Some(pending) = login_page.as_ref() {
                return pending.clone();
            }
            let mut logout_page = self.state.logout_page.lock();
            if let Some(pending) = logout_page.as_ref() {
                return pending.clone();
            }
            let pending = Handshake::new();
            *logout_page = Some(pending.clone());
            self.state.is_logged.store(false, Ordering::Release);
            pending
        };

        let logout_url = self.logout_url();
        let mut params = Vec::new();
        if !logout_url.contains(ONSUCCESS_PARAM) {
            params.push(self.onsuccess_param(success_url));
        }
        if !logout_url.contains(FROM_PARAM)
            && let Some(referrer) = self.navigator.referrer().filter(|r| !r.is_empty())
        {
            params.push(format!("{FROM_PARAM}={}", urlencoding::encode(&referrer)));
        }

        let url = build_url(&logout_url, &params);
        tracing::info!(url = %url, "redirecting to SSO logout page");
        self.navigator.redirect_to(&url);
        pending
    }

    /// Apply the SSO policy to a failed request and return the error to propagate.
    ///
    /// In order:
    /// 1. a 403 whose payload says the session is forbidden/invalid becomes a 401,
    /// 2. a 401 logs out unless the request prevents it,
    /// 3. a 471 sends the user to the login page,
    /// 4. otherwise, a user that is not logged in is logged out unless the
    ///    request skips authentication.
    ///
    /// The error is never swallowed.
    pub async fn apply_failure_policy(
        &self,
        request: &ReketRequest,
        mut error: TransportError,
    ) -> TransportError {
        if error.status() == Some(StatusCode::FORBIDDEN)
            && error
                .payload_message()
                .is_some_and(|message| EXPIRED_SESSION_MESSAGES.contains(&message))
        {
            error.set_status(StatusCode::UNAUTHORIZED);
        }

        let status = error.status().map(|s| s.as_u16());

        if status == Some(StatusCode::UNAUTHORIZED.as_u16()) {
            if !request.is_logout_prevented() {
                tracing::warn!(url = %request.url(), "request unauthorized, logging out");
                self.logout(None);
            }
            return error;
        }

        if status == Some(STATUS_LOGIN_REQUIRED) {
            tracing::warn!(url = %request.url(), "login required, redirecting to login page");
            self.redirect_to_login(None);
            return error;
        }

        if !request.is_authentication_skipped() && !self.is_logged().await {
            tracing::warn!(url = %request.url(), "request failed while not logged in, logging out");
            self.logout(None);
        }

        error
    }

    fn fresh_login_handshake(&self) -> Handshake<Option<Value>> {
        let mut login = self.state.login.lock();
        if login.is_settled() {
            *login = Handshake::new();
        }
        login.clone()
    }

    fn onsuccess_param(&self, success_url: Option<&str>) -> String {
        let target = success_url.map_or_else(|| self.navigator.current_url(), str::to_owned);
        format!("{ONSUCCESS_PARAM}={}", urlencoding::encode(&target))
    }
}

fn build_url(url: &str, params: &[String]) -> String {
    if params.is_empty() {
        return url.to_owned();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}", params.join("&"))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::client::mock::MockClient;
    use crate::navigator::RecordingNavigator;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    const PAGE: &str = "https://www.example.com/manager/#/dedicated";

    fn sso_with(navigator: &Arc<RecordingNavigator>) -> SsoAuth {
        SsoAuth::new(SsoAuthOptions {
            navigator: Some(navigator.clone()),
            ..SsoAuthOptions::default()
        })
    }

    fn forbidden(message: &str) -> TransportError {
        TransportError::new("Request failed with status code 403")
            .with_status(StatusCode::FORBIDDEN)
            .with_data(json!({ "message": message }))
    }

    #[test]
    fn test_defaults() {
        let sso = SsoAuth::default();
        assert_eq!(sso.login_url(), DEFAULT_LOGIN_URL);
        assert_eq!(sso.logout_url(), DEFAULT_LOGOUT_URL);
        assert_eq!(sso.user_url(), DEFAULT_USER_URL);
        assert!(sso.on_login_success().is_none());
        assert!(!sso.login_handshake().is_settled());
    }

    #[test]
    fn test_custom_options_and_setters() {
        let mut sso = SsoAuth::new(SsoAuthOptions {
            login_url: Some("https://login.url".to_owned()),
            logout_url: Some("https://logout.url".to_owned()),
            user_url: Some("/chi/foo/me".to_owned()),
            ..SsoAuthOptions::default()
        });
        assert_eq!(sso.login_url(), "https://login.url");
        assert_eq!(sso.logout_url(), "https://logout.url");
        assert_eq!(sso.user_url(), "/chi/foo/me");

        sso.set_login_url("/auth/login")
            .set_logout_url("/auth/logout")
            .set_user_url("/chi/fou/me")
            .set_on_login_success(|_| {});
        assert_eq!(sso.login_url(), "/auth/login");
        assert_eq!(sso.logout_url(), "/auth/logout");
        assert_eq!(sso.user_url(), "/chi/fou/me");
        assert!(sso.on_login_success().is_some());
    }

    #[tokio::test]
    async fn test_login_success() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut sso = sso_with(&navigator);
        sso.set_on_login_success(move |user| {
            assert_eq!(user["id"], 666);
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let client = Arc::new(MockClient::resolving(json!({"id": 666, "name": "The Beast"})));

        let user = sso.login(client.clone()).await;

        assert_eq!(user, Some(json!({"id": 666, "name": "The Beast"})));
        assert!(sso.is_logged().await);
        assert_eq!(sso.user(), user);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(navigator.redirects().is_empty());

        let sent = client.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url(), DEFAULT_USER_URL);
        assert_eq!(
            sent[0].headers().get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(
            sent[0].headers().get("Content-Type").map(String::as_str),
            Some("application/json;charset=utf-8")
        );
    }

    #[tokio::test]
    async fn test_login_failure_redirects_once() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let sso = sso_with(&navigator);
        let client = Arc::new(MockClient::rejecting(
            TransportError::new("unauthorized").with_status(StatusCode::UNAUTHORIZED),
        ));

        let user = sso.login(client).await;

        assert_eq!(user, None);
        assert!(!sso.is_logged().await);
        assert!(sso.login_handshake().is_settled());

        // a second redirect request is absorbed by the pending one
        sso.redirect_to_login(None);
        assert_eq!(
            navigator.redirects(),
            vec![format!("/auth?onsuccess={}", urlencoding::encode(PAGE))]
        );
    }

    #[tokio::test]
    async fn test_login_after_settle_starts_new_handshake() {
        let sso = SsoAuth::default();
        let client: Arc<dyn Transport> = Arc::new(MockClient::resolving(json!({"id": 1})));

        sso.login(Arc::clone(&client)).await;
        let first = sso.login_handshake();
        assert!(first.is_settled());

        let second = sso.fresh_login_handshake();
        assert!(!second.is_settled());
        sso.login(client).await;
        assert!(second.is_settled());
    }

    #[tokio::test]
    async fn test_spawn_login_gates_waiters() {
        let sso = SsoAuth::default();
        let client = Arc::new(MockClient::resolving(json!({"id": 1})));

        let task = sso.spawn_login(client).unwrap();
        assert!(sso.is_logged().await);
        assert_eq!(task.await.unwrap(), Some(json!({"id": 1})));
    }

    #[tokio::test]
    async fn test_setters_reach_running_login() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let sso = sso_with(&navigator);
        let client = Arc::new(MockClient::rejecting(
            TransportError::new("Request failed with status code 401")
                .with_status(StatusCode::UNAUTHORIZED),
        ));

        let task = sso.spawn_login(client.clone()).unwrap();
        let mut other = sso.clone();
        other.set_user_url("/chi/fou/me").set_login_url("/custom-login");

        assert!(!sso.is_logged().await);
        assert_eq!(task.await.unwrap(), None);
        assert_eq!(client.requests()[0].url(), "/chi/fou/me");
        assert_eq!(
            navigator.redirects(),
            vec![format!("/custom-login?onsuccess={}", urlencoding::encode(PAGE))]
        );
        assert_eq!(sso.login_url(), "/custom-login");
    }

    #[tokio::test]
    async fn test_callback_set_after_spawn_is_called() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let sso = SsoAuth::default();
        let client = Arc::new(MockClient::resolving(json!({"id": 1})));

        let task = sso.spawn_login(client).unwrap();
        sso.clone().set_on_login_success(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        task.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Navigator that logs out of its own gate from inside a redirect.
    struct LogoutOnRedirect {
        sso: std::sync::OnceLock<SsoAuth>,
        recorded: RecordingNavigator,
    }

    impl Navigator for LogoutOnRedirect {
        fn redirect_to(&self, url: &str) {
            self.recorded.redirect_to(url);
            if let Some(sso) = self.sso.get() {
                sso.logout(None);
            }
        }

        fn current_url(&self) -> String {
            PAGE.to_owned()
        }
    }

    #[test]
    fn test_navigator_may_reenter_the_gate() {
        let navigator = Arc::new(LogoutOnRedirect {
            sso: std::sync::OnceLock::new(),
            recorded: RecordingNavigator::new(PAGE),
        });
        let sso = SsoAuth::new(SsoAuthOptions {
            navigator: Some(navigator.clone()),
            ..SsoAuthOptions::default()
        });
        assert!(navigator.sso.set(sso.clone()).is_ok());

        let pending = sso.redirect_to_login(None);
        assert!(!pending.is_settled());
        // The logout issued from the redirect is suppressed by the pending login page.
        assert_eq!(navigator.recorded.redirects().len(), 1);

        let navigator = Arc::new(LogoutOnRedirect {
            sso: std::sync::OnceLock::new(),
            recorded: RecordingNavigator::new(PAGE),
        });
        let sso = SsoAuth::new(SsoAuthOptions {
            navigator: Some(navigator.clone()),
            ..SsoAuthOptions::default()
        });
        assert!(navigator.sso.set(sso.clone()).is_ok());

        sso.logout(None);
        assert_eq!(navigator.recorded.redirects().len(), 1);
    }

    #[test]
    fn test_spawn_login_without_runtime() {
        let sso = SsoAuth::default();
        let client = Arc::new(MockClient::resolving(json!({})));
        assert!(matches!(sso.spawn_login(client), Err(ReketError::NoRuntime)));
    }

    #[test]
    fn test_redirect_to_login_keeps_existing_onsuccess() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let sso = SsoAuth::new(SsoAuthOptions {
            login_url: Some("/auth?onsuccess=%2Fhome".to_owned()),
            navigator: Some(navigator.clone()),
            ..SsoAuthOptions::default()
        });

        sso.redirect_to_login(Some("https://ignored.example.com"));
        assert_eq!(navigator.redirects(), vec!["/auth?onsuccess=%2Fhome".to_owned()]);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let navigator =
            Arc::new(RecordingNavigator::new(PAGE).with_referrer("https://www.example.com/"));
        let sso = sso_with(&navigator);

        sso.logout(Some("https://www.example.com/home"));
        sso.logout(None);

        assert_eq!(
            navigator.redirects(),
            vec![format!(
                "/auth?action=disconnect&onsuccess={}&from={}",
                urlencoding::encode("https://www.example.com/home"),
                urlencoding::encode("https://www.example.com/"),
            )]
        );
    }

    #[test]
    fn test_logout_suppressed_by_pending_login_redirect() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let sso = sso_with(&navigator);

        sso.redirect_to_login(None);
        sso.logout(None);

        assert_eq!(navigator.redirects().len(), 1);
        assert!(navigator.redirects()[0].starts_with("/auth?onsuccess="));
    }

    #[tokio::test]
    async fn test_policy_remaps_expired_session_and_logs_out() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let sso = sso_with(&navigator);
        sso.login(Arc::new(MockClient::resolving(json!({"id": 1})))).await;

        let error = sso
            .apply_failure_policy(&ReketRequest::new("/me"), forbidden("This session is invalid"))
            .await;

        assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(navigator.redirects().len(), 1);
        assert!(navigator.redirects()[0].starts_with("/auth?action=disconnect&onsuccess="));
        assert!(!sso.is_logged().await);
    }

    #[tokio::test]
    async fn test_policy_keeps_plain_forbidden() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let sso = sso_with(&navigator);
        sso.login(Arc::new(MockClient::resolving(json!({"id": 1})))).await;

        let error = sso
            .apply_failure_policy(&ReketRequest::new("/me"), forbidden("Not granted"))
            .await;

        assert_eq!(error.status(), Some(StatusCode::FORBIDDEN));
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_policy_respects_prevent_logout() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let sso = sso_with(&navigator);
        sso.login(Arc::new(MockClient::resolving(json!({"id": 1})))).await;

        let error = sso
            .apply_failure_policy(
                &ReketRequest::new("/me").prevent_logout(),
                TransportError::new("unauthorized").with_status(StatusCode::UNAUTHORIZED),
            )
            .await;

        assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_policy_login_required_redirects_to_login() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let sso = sso_with(&navigator);
        sso.login(Arc::new(MockClient::resolving(json!({"id": 1})))).await;

        let status = StatusCode::from_u16(STATUS_LOGIN_REQUIRED).unwrap();
        let error = sso
            .apply_failure_policy(
                &ReketRequest::new("/me"),
                TransportError::new("login required").with_status(status),
            )
            .await;

        assert_eq!(error.status(), Some(status));
        assert_eq!(navigator.redirects().len(), 1);
        assert!(navigator.redirects()[0].starts_with("/auth?onsuccess="));
    }

    #[tokio::test]
    async fn test_policy_not_logged_logs_out_unless_skipped() {
        let navigator = Arc::new(RecordingNavigator::new(PAGE));
        let sso = sso_with(&navigator);
        // settle the handshake as "not logged" without issuing a login redirect
        sso.login_handshake().resolve(None);

        let error = TransportError::new("boom").with_status(StatusCode::INTERNAL_SERVER_ERROR);
        sso.apply_failure_policy(&ReketRequest::new("/public").no_authenticate(), error.clone())
            .await;
        assert!(navigator.redirects().is_empty());

        let error = sso.apply_failure_policy(&ReketRequest::new("/me"), error).await;
        assert_eq!(error.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(navigator.redirects().len(), 1);
        assert!(navigator.redirects()[0].starts_with("/auth?action=disconnect"));
    }

    #[test]
    fn test_build_url() {
        assert_eq!(build_url("/auth", &[]), "/auth");
        assert_eq!(build_url("/auth", &["a=1".to_owned()]), "/auth?a=1");
        assert_eq!(
            build_url("/auth?action=disconnect", &["a=1".to_owned(), "b=2".to_owned()]),
            "/auth?action=disconnect&a=1&b=2"
        );
    }
}
