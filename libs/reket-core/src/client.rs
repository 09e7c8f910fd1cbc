use crate::error::TransportError;
use crate::request::ReketRequest;
use crate::response::ReketResponse;
use async_trait::async_trait;

/// HTTP transport used by [`Reket`](crate::Reket) to perform the actual call.
///
/// Implementations resolve with a [`ReketResponse`] for successful (2xx)
/// answers and fail with a [`TransportError`] carrying status, headers and
/// payload for everything else.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: &ReketRequest) -> Result<ReketResponse, TransportError>;
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod mock {
    use super::*;
    use http::StatusCode;
    use parking_lot::Mutex;
    use serde_json::Value;

    type Handler = dyn Fn(&ReketRequest) -> Result<ReketResponse, TransportError> + Send + Sync;

    /// Transport that answers from a closure and records every request.
    pub(crate) struct MockClient {
        handler: Box<Handler>,
        requests: Mutex<Vec<ReketRequest>>,
    }

    impl MockClient {
        pub(crate) fn new(
            handler: impl Fn(&ReketRequest) -> Result<ReketResponse, TransportError>
            + Send
            + Sync
            + 'static,
        ) -> Self {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn resolving(data: Value) -> Self {
            Self::new(move |request| {
                Ok(ReketResponse::new(data.clone(), StatusCode::OK).with_config(request.clone()))
            })
        }

        pub(crate) fn rejecting(error: TransportError) -> Self {
            Self::new(move |_| Err(error.clone()))
        }

        pub(crate) fn requests(&self) -> Vec<ReketRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for MockClient {
        async fn request(&self, request: &ReketRequest) -> Result<ReketResponse, TransportError> {
            self.requests.lock().push(request.clone());
            (self.handler)(request)
        }
    }
}
