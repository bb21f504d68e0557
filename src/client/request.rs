//! Request descriptors.

use super::endpoint::EndpointKey;
use super::multipart::MultipartForm;
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Request payload.
///
/// Everything except [`RequestBody::Stream`] is held as immutable bytes and
/// can be sent again verbatim on retry.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Bytes),
    Bytes {
        content_type: String,
        bytes: Bytes,
    },
    Multipart(MultipartForm),
    /// One-shot body. Requests carrying one are never retried.
    Stream {
        content_type: String,
        body: Option<reqwest::Body>,
    },
}

impl RequestBody {
    /// Serialize `value` once, up front.
    pub fn json<B: Serialize + ?Sized>(value: &B) -> Result<Self> {
        let bytes = serde_json::to_vec(value).map_err(|e| Error::decode(e, &[]))?;
        Ok(RequestBody::Json(Bytes::from(bytes)))
    }

    pub fn is_replayable(&self) -> bool {
        !matches!(self, RequestBody::Stream { .. })
    }

    /// Attach to an outgoing request. Replayable bodies are shared, not copied;
    /// a stream body is handed over on first use.
    pub(crate) fn attach(&mut self, req: RequestBuilder) -> RequestBuilder {
        match self {
            RequestBody::Empty => req,
            RequestBody::Json(bytes) => req
                .header(CONTENT_TYPE, "application/json")
                .body(bytes.clone()),
            RequestBody::Bytes {
                content_type,
                bytes,
            } => req
                .header(CONTENT_TYPE, content_type.as_str())
                .body(bytes.clone()),
            RequestBody::Multipart(form) => req
                .header(CONTENT_TYPE, form.content_type())
                .body(form.bytes()),
            RequestBody::Stream { content_type, body } => match body.take() {
                Some(body) => req.header(CONTENT_TYPE, content_type.as_str()).body(body),
                None => req,
            },
        }
    }
}

/// Per-call knobs.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub cancel: Option<CancellationToken>,
    /// Overall deadline across all attempts and backoff sleeps.
    pub deadline: Option<Instant>,
    /// Timeout for each individual attempt; overrides the client default.
    pub attempt_timeout: Option<Duration>,
    /// Allow retries for a non-GET call that is safe to repeat.
    pub retry_safe: bool,
    /// Explicit path template for breaker accounting.
    pub endpoint: Option<String>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn retry_safe(mut self, safe: bool) -> Self {
        self.retry_safe = safe;
        self
    }

    pub fn with_endpoint(mut self, template: impl Into<String>) -> Self {
        self.endpoint = Some(template.into());
        self
    }
}

/// One logical call: method, relative path, query, body and options.
#[derive(Debug)]
pub struct RequestSpec {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: RequestBody,
    pub(crate) accept: String,
    pub(crate) options: CallOptions,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            accept: "application/json".to_string(),
            options: CallOptions::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, value: &B) -> Result<Self> {
        self.body = RequestBody::json(value)?;
        Ok(self)
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    pub fn options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn retry_safe(mut self, safe: bool) -> Self {
        self.options.retry_safe = safe;
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.options.cancel = Some(token);
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.options.deadline = Some(deadline);
        self
    }

    pub fn endpoint(mut self, template: impl Into<String>) -> Self {
        self.options.endpoint = Some(template.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn endpoint_key(&self) -> EndpointKey {
        match &self.options.endpoint {
            Some(template) => EndpointKey::new(self.method.clone(), template.clone()),
            None => EndpointKey::from_path(self.method.clone(), &self.path),
        }
    }

    /// GET is always retried; other verbs only when marked safe. A body that
    /// cannot be replayed byte-for-byte disables retries for any verb.
    pub fn retries_permitted(&self) -> bool {
        self.body.is_replayable() && (self.method == Method::GET || self.options.retry_safe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_retries_by_default() {
        assert!(RequestSpec::get("/people").retries_permitted());
    }

    #[test]
    fn mutating_verbs_need_explicit_opt_in() {
        let post = RequestSpec::post("/invoices")
            .json(&serde_json::json!({"amount": "10.00"}))
            .unwrap();
        assert!(!post.retries_permitted());
        assert!(post.retry_safe(true).retries_permitted());
        assert!(!RequestSpec::delete("/contracts/c1").retries_permitted());
    }

    #[test]
    fn stream_body_is_never_retried() {
        let spec = RequestSpec::get("/exports")
            .body(RequestBody::Stream {
                content_type: "application/octet-stream".to_string(),
                body: Some(reqwest::Body::from("chunk")),
            })
            .retry_safe(true);
        assert!(!spec.retries_permitted());
    }

    #[test]
    fn endpoint_override_controls_key() {
        let spec = RequestSpec::get("/reports/2024-q1").endpoint("/reports/{period}");
        assert_eq!(spec.endpoint_key().template(), "/reports/{period}");
        assert_eq!(
            RequestSpec::get("/reports/2024-q1").endpoint_key().template(),
            "/reports/{id}"
        );
    }

    #[test]
    fn json_body_is_serialized_once() {
        let spec = RequestSpec::patch("/people/p1")
            .json(&serde_json::json!({"title": "CFO"}))
            .unwrap();
        match &spec.body {
            RequestBody::Json(bytes) => assert_eq!(&bytes[..], br#"{"title":"CFO"}"#),
            other => panic!("unexpected body: {other:?}"),
        }
    }
}
