/// A single named configuration slot.
#[derive(Debug, Clone)]
pub struct ConfigItem<T> {
    value: Option<T>,
}

impl<T> ConfigItem<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn set(&mut self, value: T) -> &mut Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Default for ConfigItem<T> {
    fn default() -> Self {
        Self::new()
    }
}
