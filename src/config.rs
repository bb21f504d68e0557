//! Client configuration: YAML file plus `PAYROLL_*` environment overlay.
//!
//! ```yaml
//! base_url: https://api.payroll.example/rest/v2
//! api_token: tok_live_xxx
//! timeout_secs: 30
//! retry:
//!   max_attempts: 4
//! circuit_breaker:
//!   cooldown_secs: 10
//! ```
//!
//! Environment values win over file values. Unparseable env values are
//! ignored with a warning rather than failing startup.

use crate::error::ErrorContext;
use crate::resilience::{CircuitBreakerConfig, RetryPolicy};
use crate::secret::Credential;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::from(&RetryPolicy::default())
    }
}

impl From<&RetryPolicy> for RetrySettings {
    fn from(p: &RetryPolicy) -> Self {
        Self {
            max_attempts: p.max_attempts,
            base_delay_ms: p.base_delay.as_millis() as u64,
            max_delay_ms: p.max_delay.as_millis() as u64,
            jitter_ms: p.jitter.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(self.max_attempts)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_jitter(Duration::from_millis(self.jitter_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub window_secs: u64,
    pub cooldown_secs: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        let cfg = CircuitBreakerConfig::default();
        Self {
            failure_threshold: cfg.failure_threshold,
            window_secs: cfg.window.as_secs(),
            cooldown_secs: cfg.cooldown.as_secs(),
        }
    }
}

impl BreakerSettings {
    pub fn to_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new()
            .with_failure_threshold(self.failure_threshold)
            .with_window(Duration::from_secs(self.window_secs))
            .with_cooldown(Duration::from_secs(self.cooldown_secs))
    }
}

/// Everything needed to build an [`crate::ApiClient`].
///
/// Serializing a config (for diagnostics) never emits the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_token: Option<Credential>,
    pub timeout_secs: u64,
    pub attempt_timeout_ms: Option<u64>,
    pub debug: bool,
    pub retry: RetrySettings,
    pub circuit_breaker: BreakerSettings,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_secs: u64,
    pub proxy_url: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: None,
            timeout_secs: 30,
            attempt_timeout_ms: None,
            debug: false,
            retry: RetrySettings::default(),
            circuit_breaker: BreakerSettings::default(),
            pool_max_idle_per_host: 32,
            pool_idle_timeout_secs: 90,
            proxy_url: None,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid client config: {}", e),
                ErrorContext::new().with_source("config"),
            )
        })
    }

    /// Load a YAML file, then overlay `PAYROLL_*` environment variables.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read client config: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("config"),
            )
        })?;
        let mut cfg = Self::from_yaml_str(&raw)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Defaults overlaid with `PAYROLL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`; used by tests to avoid touching the
    /// process environment.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("PAYROLL_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = get("PAYROLL_API_TOKEN") {
            self.api_token = Some(Credential::new(v));
        }
        if let Some(v) = parse_env(&get, "PAYROLL_HTTP_TIMEOUT_SECS") {
            self.timeout_secs = v;
        }
        if let Some(v) = parse_env::<u64>(&get, "PAYROLL_ATTEMPT_TIMEOUT_MS") {
            self.attempt_timeout_ms = (v > 0).then_some(v);
        }
        if let Some(v) = get("PAYROLL_DEBUG") {
            self.debug = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(v) = parse_env(&get, "PAYROLL_MAX_ATTEMPTS") {
            self.retry.max_attempts = v;
        }
        if let Some(v) = parse_env(&get, "PAYROLL_BREAKER_FAILURE_THRESHOLD") {
            self.circuit_breaker.failure_threshold = v;
        }
        if let Some(v) = parse_env(&get, "PAYROLL_BREAKER_COOLDOWN_SECS") {
            self.circuit_breaker.cooldown_secs = v;
        }
        if let Some(v) = parse_env(&get, "PAYROLL_HTTP_POOL_MAX_IDLE_PER_HOST") {
            self.pool_max_idle_per_host = v;
        }
        if let Some(v) = get("PAYROLL_PROXY_URL") {
            self.proxy_url = Some(v);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_env<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = get(key)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = raw.as_str(), "ignoring unparseable environment value");
            None
        }
    }
}
