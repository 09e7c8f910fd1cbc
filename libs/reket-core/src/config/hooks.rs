use crate::error::ReketError;
use crate::response::ReketResponse;
use std::fmt;
use std::sync::Arc;

/// Called with every successful response; its return value is what the caller receives.
pub type SuccessHook = Arc<dyn Fn(ReketResponse) -> ReketResponse + Send + Sync>;

/// Called with every failure; its return value becomes the error the caller receives.
pub type ErrorHook = Arc<dyn Fn(ReketError) -> ReketError + Send + Sync>;

/// Success/error callback slots of the response pipeline.
#[derive(Clone, Default)]
pub struct ReketHook {
    on_success: Option<SuccessHook>,
    on_error: Option<ErrorHook>,
}

impl ReketHook {
    #[must_use]
    pub fn new(on_success: Option<SuccessHook>, on_error: Option<ErrorHook>) -> Self {
        let mut hook = Self::default();
        hook.set(on_success, on_error);
        hook
    }

    /// Assign the provided slots. Omitted slots keep their current callback.
    pub fn set(&mut self, on_success: Option<SuccessHook>, on_error: Option<ErrorHook>) -> &mut Self {
        if let Some(on_success) = on_success {
            self.on_success = Some(on_success);
        }
        if let Some(on_error) = on_error {
            self.on_error = Some(on_error);
        }
        self
    }

    pub fn set_on_success(
        &mut self,
        on_success: impl Fn(ReketResponse) -> ReketResponse + Send + Sync + 'static,
    ) -> &mut Self {
        self.set(Some(Arc::new(on_success)), None)
    }

    pub fn set_on_error(
        &mut self,
        on_error: impl Fn(ReketError) -> ReketError + Send + Sync + 'static,
    ) -> &mut Self {
        self.set(None, Some(Arc::new(on_error)))
    }

    #[must_use]
    pub fn on_success(&self) -> Option<&SuccessHook> {
        self.on_success.as_ref()
    }

    #[must_use]
    pub fn on_error(&self) -> Option<&ErrorHook> {
        self.on_error.as_ref()
    }

    pub(crate) fn apply(
        &self,
        result: Result<ReketResponse, ReketError>,
    ) -> Result<ReketResponse, ReketError> {
        match result {
            Ok(response) => Ok(match &self.on_success {
                Some(hook) => hook(response),
                None => response,
            }),
            Err(error) => Err(match &self.on_error {
                Some(hook) => hook(error),
                None => error,
            }),
        }
    }
}

impl fmt::Debug for ReketHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReketHook")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Hooks grouped by pipeline stage.
#[derive(Debug, Clone, Default)]
pub struct ConfigHooks {
    response: ReketHook,
}

impl ConfigHooks {
    #[must_use]
    pub fn response(&self) -> &ReketHook {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ReketHook {
        &mut self.response
    }
}
