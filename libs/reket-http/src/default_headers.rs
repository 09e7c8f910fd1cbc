use crate::config::DEFAULT_ACCEPT;
use crate::error::HttpTransportError;
use http::header::{ACCEPT, HeaderName, USER_AGENT};
use http::{HeaderMap, HeaderValue, Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer filling in headers a request does not carry itself.
///
/// Always provides `User-Agent` and `Accept`; headers set on the request win.
#[derive(Clone, Debug)]
pub struct DefaultHeadersLayer {
    defaults: Arc<HeaderMap>,
}

impl DefaultHeadersLayer {
    /// Defaults with the given `User-Agent` and [`DEFAULT_ACCEPT`].
    ///
    /// # Errors
    /// Returns `HttpTransportError::InvalidHeaderValue` if `user_agent` is not a valid header value
    pub fn try_new(user_agent: impl AsRef<str>) -> Result<Self, HttpTransportError> {
        let mut defaults = HeaderMap::with_capacity(2);
        defaults.insert(USER_AGENT, HeaderValue::from_str(user_agent.as_ref())?);
        defaults.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        Ok(Self {
            defaults: Arc::new(defaults),
        })
    }

    /// Add (or replace) one default header.
    ///
    /// # Errors
    /// Returns an error if the name or value is not a valid header
    pub fn try_with_header(
        mut self,
        name: &str,
        value: &str,
    ) -> Result<Self, HttpTransportError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        Arc::make_mut(&mut self.defaults).insert(name, value);
        Ok(self)
    }

    #[must_use]
    pub fn defaults(&self) -> &HeaderMap {
        &self.defaults
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            defaults: Arc::clone(&self.defaults),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DefaultHeadersService<S> {
    inner: S,
    defaults: Arc<HeaderMap>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        for (name, value) in self.defaults.iter() {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        self.inner.call(req)
    }
}
