use crate::request::RequestType;

/// Insertion-ordered registry of request types.
///
/// The first inserted type is the default one. Adding an existing type
/// replaces its prefix but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct RequestTypes {
    entries: Vec<RequestType>,
}

impl RequestTypes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a single mapping.
    pub fn add(&mut self, request_type: impl Into<String>, url_prefix: impl Into<String>) -> &mut Self {
        self.insert(RequestType::new(request_type, url_prefix));
        self
    }

    /// Insert every mapping in order.
    pub fn add_all(&mut self, request_types: impl IntoIterator<Item = RequestType>) -> &mut Self {
        for request_type in request_types {
            self.insert(request_type);
        }
        self
    }

    #[must_use]
    pub fn url_prefix(&self, request_type: &str) -> Option<&str> {
        self.get(request_type).map(RequestType::url_prefix)
    }

    /// Prefix of the first inserted type.
    #[must_use]
    pub fn default_url_prefix(&self) -> Option<&str> {
        self.entries.first().map(RequestType::url_prefix)
    }

    #[must_use]
    pub fn get(&self, request_type: &str) -> Option<&RequestType> {
        self.entries
            .iter()
            .find(|entry| entry.request_type() == request_type)
    }

    #[must_use]
    pub fn contains(&self, request_type: &str) -> bool {
        self.get(request_type).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestType> {
        self.entries.iter()
    }

    fn insert(&mut self, request_type: RequestType) {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.request_type() == request_type.request_type())
        {
            Some(existing) => *existing = request_type,
            None => self.entries.push(request_type),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let types = RequestTypes::new();
        assert!(types.is_empty());
        assert_eq!(types.default_url_prefix(), None);
        assert_eq!(types.url_prefix("v6"), None);
    }

    #[test]
    fn test_first_inserted_is_default() {
        let mut types = RequestTypes::new();
        types.add_all([
            RequestType::new("1.0", "/v1.0"),
            RequestType::new("2.0", "/v2.0"),
        ]);

        assert_eq!(types.len(), 2);
        assert_eq!(types.default_url_prefix(), Some("/v1.0"));
        assert_eq!(types.url_prefix("2.0"), Some("/v2.0"));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut types = RequestTypes::new();
        types.add("1.0", "/v1.0").add("2.0", "/v2.0").add("1.0", "/v1.1");

        assert_eq!(types.len(), 2);
        assert_eq!(types.default_url_prefix(), Some("/v1.1"));
        let order: Vec<_> = types.iter().map(RequestType::request_type).collect();
        assert_eq!(order, vec!["1.0", "2.0"]);
    }
}
