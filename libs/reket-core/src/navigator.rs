use parking_lot::Mutex;

/// Page navigation capability used by the SSO gate.
///
/// In a browser this maps to `location.assign`, `location.href` and
/// `document.referrer`. Native hosts either log the redirect
/// ([`LogNavigator`]) or hand it over to whatever opens the login page.
pub trait Navigator: Send + Sync {
    /// Leave the current page for `url`.
    fn redirect_to(&self, url: &str);

    /// URL of the current page, used as the default `onsuccess` target.
    fn current_url(&self) -> String;

    /// URL of the referring page, if known.
    fn referrer(&self) -> Option<String> {
        None
    }
}

/// Navigator that only records redirects in the log.
#[derive(Debug, Clone, Default)]
pub struct LogNavigator {
    current_url: String,
}

impl LogNavigator {
    #[must_use]
    pub fn new(current_url: impl Into<String>) -> Self {
        Self {
            current_url: current_url.into(),
        }
    }
}

impl Navigator for LogNavigator {
    fn redirect_to(&self, url: &str) {
        tracing::info!(target: "reket::sso", url = %url, "redirect requested");
    }

    fn current_url(&self) -> String {
        self.current_url.clone()
    }
}

/// Navigator that keeps every redirect it was asked to perform.
///
/// Useful as a test double for the SSO flows.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    current_url: String,
    referrer: Option<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new(current_url: impl Into<String>) -> Self {
        Self {
            current_url: current_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    /// Redirect targets in call order.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to(&self, url: &str) {
        self.redirects.lock().push(url.to_owned());
    }

    fn current_url(&self) -> String {
        self.current_url.clone()
    }

    fn referrer(&self) -> Option<String> {
        self.referrer.clone()
    }
}
