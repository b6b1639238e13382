//! Per-call request bindings: URI plus an ordered multi-valued parameter
//! map. Created by the request-construction layer, discarded after the
//! response; never shared across calls.

use url::Url;

/// Parameter names with this prefix are reserved for the engine
/// (`_view`, `_limit`, `_offset`, geo parameters) and never treated as
/// property filters.
pub const RESERVED_PREFIX: &str = "_";

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    uri: Url,
    params: Vec<(String, Vec<String>)>,
}

impl Request {
    /// Build a request from a URI, seeding parameters from its query
    /// string in order.
    pub fn new(uri: Url) -> Self {
        let mut request = Request {
            params: Vec::new(),
            uri,
        };
        let pairs: Vec<(String, String)> = request
            .uri
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        for (name, value) in pairs {
            request.add(name, value);
        }
        request
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Append a value, preserving first-seen parameter order.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value.into()),
            None => self.params.push((name, vec![value.into()])),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.params.retain(|(n, _)| n != name);
    }

    /// First bound value, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    pub fn all(&self, name: &str) -> &[String] {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Parameter names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_reserved(name: &str) -> bool {
        name.starts_with(RESERVED_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(uri: &str) -> Request {
        Request::new(Url::parse(uri).expect("test uri parses"))
    }

    #[test]
    fn query_pairs_seed_ordered_multimap() {
        let r = request("http://api.example.org/alerts?severity=3&tag=a&tag=b");
        assert_eq!(r.first("severity"), Some("3"));
        assert_eq!(r.all("tag"), &["a".to_string(), "b".to_string()]);
        assert_eq!(r.names().collect::<Vec<_>>(), vec!["severity", "tag"]);
    }

    #[test]
    fn add_and_remove() {
        let mut r = request("http://api.example.org/alerts");
        r.add("severity", "2");
        r.add("severity", "3");
        assert_eq!(r.all("severity").len(), 2);
        r.remove("severity");
        assert_eq!(r.first("severity"), None);
    }

    #[test]
    fn missing_parameter_is_empty() {
        let r = request("http://api.example.org/alerts");
        assert_eq!(r.first("x"), None);
        assert!(r.all("x").is_empty());
    }

    #[test]
    fn reserved_names() {
        assert!(Request::is_reserved("_view"));
        assert!(!Request::is_reserved("severity"));
    }
}
