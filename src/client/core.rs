use super::multipart::MultipartForm;
use super::request::{CallOptions, RequestSpec};
use crate::codec::{Page, Paginator};
use crate::resilience::circuit_breaker::{CircuitBreakerSnapshot, CircuitRegistry};
use crate::resilience::retry::RetryPolicy;
use crate::secret::Credential;
use crate::Result;
use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::endpoint::EndpointKey;

/// Transport client for the payroll platform.
///
/// Owns the connection pool, the bearer credential and the per-endpoint
/// breaker registry. Cloning is cheap and clones share all of them.
///
/// The verbs return raw response bytes; decoding is left to the caller (see
/// [`crate::codec`]).
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) credential: Credential,
    pub(crate) debug: bool,
    pub(crate) retry: RetryPolicy,
    pub(crate) attempt_timeout: Option<Duration>,
    pub(crate) breakers: Arc<CircuitRegistry>,
}

impl ApiClient {
    pub fn builder() -> super::builder::ApiClientBuilder {
        super::builder::ApiClientBuilder::new()
    }

    /// Client configured from `PAYROLL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = crate::config::ClientConfig::from_env()?;
        super::builder::ApiClientBuilder::from_config(&config).build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn get(&self, path: &str) -> Result<Bytes> {
        self.execute(RequestSpec::get(path)).await
    }

    pub async fn get_with(&self, path: &str, options: CallOptions) -> Result<Bytes> {
        self.execute(RequestSpec::get(path).options(options)).await
    }

    /// GET a binary document (PDF, CSV, ...). The body is passed through untouched.
    pub async fn get_raw(&self, path: &str) -> Result<Bytes> {
        self.execute(RequestSpec::get(path).accept("*/*")).await
    }

    /// POST a JSON body. Not retried.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Bytes> {
        self.execute(RequestSpec::post(path).json(body)?).await
    }

    /// POST a JSON body that the platform treats idempotently; retried like GET.
    pub async fn post_idempotent<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Bytes> {
        self.execute(RequestSpec::post(path).json(body)?.retry_safe(true))
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Bytes> {
        self.execute(RequestSpec::patch(path).json(body)?).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Bytes> {
        self.execute(RequestSpec::put(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<Bytes> {
        self.execute(RequestSpec::delete(path)).await
    }

    /// POST a multipart form. The form is already encoded, so passing
    /// `CallOptions::retry_safe(true)` via [`ApiClient::execute`] resends the
    /// same bytes on every attempt.
    pub async fn upload_multipart(&self, path: &str, form: MultipartForm) -> Result<Bytes> {
        self.execute(RequestSpec::post(path).multipart(form)).await
    }

    /// Walk a list endpoint page by page.
    ///
    /// The cursor is sent as the `cursor` query parameter; `decode` turns each
    /// response body into a page (usually [`crate::codec::decode_list`]).
    pub fn paginate<'a, T, D>(&'a self, path: &'a str, decode: D) -> Paginator<'a, T>
    where
        T: Send + 'a,
        D: Fn(&[u8]) -> Result<Page<T>> + Send + Sync + 'a,
    {
        self.paginate_with(path, "cursor", decode)
    }

    /// [`ApiClient::paginate`] with a custom cursor parameter name.
    pub fn paginate_with<'a, T, D>(
        &'a self,
        path: &'a str,
        cursor_param: &'a str,
        decode: D,
    ) -> Paginator<'a, T>
    where
        T: Send + 'a,
        D: Fn(&[u8]) -> Result<Page<T>> + Send + Sync + 'a,
    {
        let decode = Arc::new(decode);
        Paginator::new(move |cursor: Option<String>| {
            let decode = Arc::clone(&decode);
            async move {
                let mut spec = RequestSpec::get(path);
                if let Some(c) = cursor {
                    spec = spec.query(cursor_param, c);
                }
                let bytes = self.execute(spec).await?;
                decode(&bytes[..])
            }
        })
    }

    /// Breaker state for `method` + `template`, if that endpoint has been called.
    pub fn breaker_snapshot(&self, method: Method, template: &str) -> Option<CircuitBreakerSnapshot> {
        self.breakers.snapshot(&EndpointKey::new(method, template))
    }

    /// Forget all breaker state.
    pub fn reset_breakers(&self) {
        self.breakers.reset();
    }
}
