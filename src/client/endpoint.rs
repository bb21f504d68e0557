//! Endpoint keys for per-endpoint breaker accounting.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;
use std::fmt;

static VERSION_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^v\d+$").expect("valid regex"));
static HAS_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid regex"));

/// `(method, path template)` pair identifying an endpoint, e.g. `GET /contracts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    method: Method,
    template: String,
}

impl EndpointKey {
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
        }
    }

    /// Key for a concrete path, with identifier segments folded into `{id}`.
    pub fn from_path(method: Method, path: &str) -> Self {
        Self::new(method, template_for(path))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

/// Derive a path template: drops the query string and replaces every segment
/// that carries a digit (ids, uuids, dates) with `{id}`. Version segments
/// such as `v2` are kept.
///
/// Identifiers without a digit (`/people/alice`) are not recognized and stay
/// as-is, so each one gets its own breaker. Set the template explicitly with
/// [`RequestSpec::endpoint`](crate::RequestSpec::endpoint) for such paths.
pub fn template_for(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if HAS_DIGIT.is_match(s) && !VERSION_SEGMENT.is_match(s) {
                "{id}"
            } else {
                s
            }
        })
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_fold_into_placeholders() {
        assert_eq!(template_for("/contracts/37nex2x/documents"), "/contracts/{id}/documents");
        assert_eq!(
            template_for("/people/9b2f1c9e-5a55-4c55-8d1e-0c9a7b3f7c11"),
            "/people/{id}"
        );
        assert_eq!(template_for("/invoices/12345"), "/invoices/{id}");
    }

    #[test]
    fn static_paths_are_unchanged() {
        assert_eq!(template_for("/contracts"), "/contracts");
        assert_eq!(template_for("contracts/"), "/contracts");
        assert_eq!(template_for("/"), "/");
    }

    #[test]
    fn digitless_identifiers_are_not_folded() {
        assert_eq!(template_for("/people/alice"), "/people/alice");
        assert_ne!(template_for("/people/alice"), template_for("/people/bob"));
    }

    #[test]
    fn version_segments_are_kept_and_query_dropped() {
        assert_eq!(
            template_for("/v2/timesheets/ts_881?limit=50&cursor=abc1"),
            "/v2/timesheets/{id}"
        );
    }

    #[test]
    fn keys_differ_by_method() {
        let get = EndpointKey::from_path(Method::GET, "/contracts/c1");
        let delete = EndpointKey::from_path(Method::DELETE, "/contracts/c2");
        assert_ne!(get, delete);
        assert_eq!(get, EndpointKey::new(Method::GET, "/contracts/{id}"));
        assert_eq!(get.to_string(), "GET /contracts/{id}");
    }
}
