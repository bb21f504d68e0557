use crate::client::core::ApiClient;
use crate::config::ClientConfig;
use crate::error::ErrorContext;
use crate::resilience::{CircuitBreakerConfig, CircuitRegistry, RetryPolicy};
use crate::secret::Credential;
use crate::{Error, Result};
use reqwest::header::HeaderValue;
use reqwest::Proxy;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Builder for [`ApiClient`].
///
/// Only the base URL and the credential are required.
pub struct ApiClientBuilder {
    base_url: Option<String>,
    credential: Option<Credential>,
    timeout: Duration,
    attempt_timeout: Option<Duration>,
    debug: bool,
    retry: RetryPolicy,
    breaker: CircuitBreakerConfig,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    proxy_url: Option<String>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            credential: None,
            timeout: Duration::from_secs(30),
            attempt_timeout: None,
            debug: false,
            retry: RetryPolicy::default(),
            breaker: CircuitBreakerConfig::default(),
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            proxy_url: None,
            user_agent: None,
        }
    }

    /// Seed every setting from a loaded [`ClientConfig`].
    pub fn from_config(cfg: &ClientConfig) -> Self {
        let mut builder = Self::new()
            .base_url(cfg.base_url.clone())
            .timeout(cfg.timeout())
            .debug(cfg.debug)
            .retry_policy(cfg.retry.to_policy())
            .circuit_breaker(cfg.circuit_breaker.to_config())
            .pool_max_idle_per_host(cfg.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(cfg.pool_idle_timeout_secs));
        builder.credential = cfg.api_token.clone();
        builder.attempt_timeout = cfg.attempt_timeout();
        builder.proxy_url = cfg.proxy_url.clone();
        builder.user_agent = cfg.user_agent.clone();
        builder
    }

    /// Base URL, e.g. `https://api.payroll.example/rest/v2`. Request paths are
    /// appended to it.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn credential(mut self, credential: impl Into<Credential>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Global per-request timeout applied by the HTTP client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout for each individual attempt. Calls can override it through
    /// [`crate::CallOptions`].
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Log one line per request attempt (method, path, status, elapsed).
    pub fn debug(mut self, enable: bool) -> Self {
        self.debug = enable;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn circuit_breaker(mut self, cfg: CircuitBreakerConfig) -> Self {
        self.breaker = cfg;
        self
    }

    pub fn pool_max_idle_per_host(mut self, n: usize) -> Self {
        self.pool_max_idle_per_host = n;
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let raw_url = self.base_url.unwrap_or_default();
        let base_url = Url::parse(raw_url.trim()).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(raw_url.clone())
                    .with_source("client_builder"),
            )
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("unsupported base URL scheme: {}", base_url.scheme()),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_source("client_builder"),
            ));
        }

        let credential = match self.credential {
            Some(c) if !c.is_empty() => c,
            _ => {
                return Err(Error::configuration_with_context(
                    "missing API credential",
                    ErrorContext::new()
                        .with_field_path("api_token")
                        .with_details("set PAYROLL_API_TOKEN or ApiClientBuilder::credential")
                        .with_source("client_builder"),
                ))
            }
        };
        if HeaderValue::from_str(&format!("Bearer {}", credential.expose())).is_err() {
            return Err(Error::configuration_with_context(
                "API credential is not a valid header value",
                ErrorContext::new()
                    .with_field_path("api_token")
                    .with_details("the token contains control or non-visible characters")
                    .with_source("client_builder"),
            ));
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("payroll-client/{}", env!("CARGO_PKG_VERSION")));

        let mut http = reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(Some(self.pool_idle_timeout))
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10))
            .user_agent(user_agent);

        if let Some(proxy_url) = self.proxy_url.as_deref() {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid proxy URL: {}", e),
                    ErrorContext::new()
                        .with_field_path("proxy_url")
                        .with_source("client_builder"),
                )
            })?;
            http = http.proxy(proxy);
        }

        let http = http.build().map_err(|e| {
            Error::configuration_with_context(
                format!("cannot build HTTP client: {}", e),
                ErrorContext::new().with_source("client_builder"),
            )
        })?;

        Ok(ApiClient {
            http,
            base_url,
            credential,
            debug: self.debug,
            retry: self.retry,
            attempt_timeout: self.attempt_timeout,
            breakers: Arc::new(CircuitRegistry::new(self.breaker)),
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
