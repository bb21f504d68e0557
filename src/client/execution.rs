//! Request executor: breaker gate, retry loop, single attempts.

use super::classify::{classify_response, classify_transport, retry_after};
use super::core::ApiClient;
use super::request::RequestSpec;
use crate::error::CancelReason;
use crate::resilience::retry::{deadline_reached, sleep_cancellable, Decision, RetryPolicy};
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::header::ACCEPT;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-client-request-id";

impl ApiClient {
    /// Run one logical call and return the raw response body.
    ///
    /// Fails fast with [`Error::CircuitOpen`] while the endpoint's breaker is
    /// open. Retryable failures are retried with backoff when the request
    /// permits it; the first non-retryable failure, or the last failure once
    /// attempts run out, is returned.
    pub async fn execute(&self, mut spec: RequestSpec) -> Result<Bytes> {
        let key = spec.endpoint_key();
        let breaker = self.breakers.breaker(&key);
        breaker.allow()?;

        let url = self.url_for(&spec.path)?;
        let fallback_policy;
        let policy: &RetryPolicy = if spec.retries_permitted() {
            &self.retry
        } else {
            fallback_policy = RetryPolicy::none();
            &fallback_policy
        };
        let cancel = spec.options.cancel.clone().unwrap_or_default();
        let deadline = spec.options.deadline;
        let request_id = Uuid::new_v4().to_string();

        let mut attempt: u32 = 0;
        loop {
            match self
                .send_once(&mut spec, &url, &request_id, &cancel, deadline)
                .await
            {
                Ok(body) => {
                    breaker.on_success();
                    return Ok(body);
                }
                // The attempt never completed; it says nothing about endpoint health.
                Err(err @ Error::Canceled { .. }) => return Err(err),
                // Rejected locally before reaching the wire; the endpoint is not at fault.
                Err(err @ Error::Configuration { .. }) => return Err(err),
                Err(err) => {
                    breaker.on_failure();
                    match policy.decide(&err, attempt) {
                        Decision::Retry { delay } => {
                            info!(
                                endpoint = %key,
                                attempt = attempt + 1,
                                max_attempts = policy.max_attempts,
                                error_class = err.kind().as_str(),
                                delay_ms = delay.as_millis() as u64,
                                "payroll request failed, retrying"
                            );
                            sleep_cancellable(delay, &cancel, deadline).await?;
                            if breaker.allow().is_err() {
                                return Err(err);
                            }
                            attempt += 1;
                        }
                        Decision::Fail => {
                            info!(
                                endpoint = %key,
                                attempts = attempt + 1,
                                error_class = err.kind().as_str(),
                                http_status = err.status().unwrap_or(0),
                                "payroll request failed"
                            );
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    async fn send_once(
        &self,
        spec: &mut RequestSpec,
        url: &Url,
        request_id: &str,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<Bytes> {
        let mut req = self
            .http
            .request(spec.method.clone(), url.clone())
            .header(ACCEPT, spec.accept.as_str())
            .header(REQUEST_ID_HEADER, request_id);
        if !spec.query.is_empty() {
            req = req.query(&spec.query);
        }
        if let Some(t) = spec.options.attempt_timeout.or(self.attempt_timeout) {
            req = req.timeout(t);
        }
        req = spec.body.attach(req);
        req = req.bearer_auth(self.credential.expose());

        let start = std::time::Instant::now();
        let exchange = async move {
            let resp = req.send().await.map_err(|e| classify_transport(&e))?;
            let status = resp.status().as_u16();
            let hint = retry_after(resp.headers());
            let body = resp.bytes().await.map_err(|e| classify_transport(&e))?;
            Ok::<_, Error>((status, hint, body))
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Canceled { reason: CancelReason::Caller }),
            _ = deadline_reached(deadline) => Err(Error::Canceled { reason: CancelReason::Deadline }),
            res = exchange => res,
        };

        if self.debug {
            info!(
                method = %spec.method,
                path = spec.path.as_str(),
                http_status = outcome.as_ref().map(|(s, _, _)| *s).unwrap_or(0),
                duration_ms = start.elapsed().as_millis() as u64,
                "payroll request"
            );
        }

        let (status, hint, body) = outcome?;
        match classify_response(status, hint, &body) {
            Some(err) => Err(err),
            None => Ok(body),
        }
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        };
        Url::parse(&joined).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid request path: {}", e),
                crate::ErrorContext::new()
                    .with_field_path("path")
                    .with_details(path.to_string())
                    .with_source("request_executor"),
            )
        })
    }
}
