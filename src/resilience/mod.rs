//! Resilience primitives: per-endpoint circuit breaking and retry with backoff.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`circuit_breaker`] | Per-endpoint failure tracking and fail-fast gating |
//! | [`retry`] | Exponential backoff policy and cancellable sleep |
//!
//! ## Circuit Breaker
//!
//! - **Closed**: normal operation, requests pass through
//! - **Open**: failures reached the threshold, requests fail fast
//! - **Half-Open**: cooldown elapsed, the next outcome decides
//!
//! ```rust
//! use payroll_client::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::new()
//!     .with_failure_threshold(5)
//!     .with_cooldown(Duration::from_secs(30));
//! let breaker = CircuitBreaker::new("GET /contracts", config);
//!
//! if breaker.allow().is_ok() {
//!     // Make API call...
//!     breaker.on_success();
//! }
//! ```

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, CircuitRegistry, CircuitState,
};
pub use retry::{Decision, RetryPolicy};
