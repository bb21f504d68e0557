use crate::client::endpoint::EndpointKey;
use crate::{Error, Result};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerSnapshot {
    pub state: CircuitState,
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
    /// Failures since the last success that fall inside the rolling window.
    pub consecutive_failures: u32,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    /// Failures further apart than this do not accumulate.
    pub window: Duration,
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

#[derive(Debug)]
struct State {
    state: CircuitState,
    /// Failure times inside the rolling window, oldest first. Never longer
    /// than the threshold.
    recent_failures: VecDeque<Instant>,
    opened_at: Option<Instant>,
}

/// Breaker for a single endpoint.
///
/// - Closed: calls pass, failures are counted
/// - Open: calls fail fast until the cooldown elapses
/// - HalfOpen: calls pass; the next outcome closes or re-opens the circuit
#[derive(Debug)]
pub struct CircuitBreaker {
    label: String,
    cfg: CircuitBreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(label: impl Into<String>, cfg: CircuitBreakerConfig) -> Self {
        Self {
            label: label.into(),
            cfg,
            state: Mutex::new(State {
                state: CircuitState::Closed,
                recent_failures: VecDeque::new(),
                opened_at: None,
            }),
        }
    }

    // Critical sections never panic, so a poisoned lock still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Gate a call. Returns the state the call proceeds under, or
    /// [`Error::CircuitOpen`] while the cooldown is running.
    pub fn allow(&self) -> Result<CircuitState> {
        let mut st = self.lock();
        if st.state == CircuitState::Open {
            let opened_at = st.opened_at.unwrap_or_else(Instant::now);
            let elapsed = opened_at.elapsed();
            if elapsed < self.cfg.cooldown {
                return Err(Error::CircuitOpen {
                    endpoint: self.label.clone(),
                    retry_in: self.cfg.cooldown - elapsed,
                });
            }
            st.state = CircuitState::HalfOpen;
            info!(endpoint = self.label.as_str(), "circuit half-open, admitting trial call");
        }
        Ok(st.state)
    }

    pub fn on_success(&self) {
        let mut st = self.lock();
        if st.state != CircuitState::Closed {
            info!(endpoint = self.label.as_str(), "circuit closed");
        }
        st.state = CircuitState::Closed;
        st.recent_failures.clear();
        st.opened_at = None;
    }

    /// Record a failed attempt. Returns `true` if this failure opened the circuit.
    pub fn on_failure(&self) -> bool {
        let mut st = self.lock();
        let now = Instant::now();

        st.recent_failures.push_back(now);
        while let Some(&oldest) = st.recent_failures.front() {
            if now.duration_since(oldest) > self.cfg.window {
                st.recent_failures.pop_front();
            } else {
                break;
            }
        }
        let cap = self.cfg.failure_threshold as usize;
        while st.recent_failures.len() > cap {
            st.recent_failures.pop_front();
        }
        let failures = st.recent_failures.len() as u32;

        let trip = match st.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => failures >= self.cfg.failure_threshold,
            CircuitState::Open => false,
        };
        if trip {
            st.state = CircuitState::Open;
            st.opened_at = Some(now);
            warn!(
                endpoint = self.label.as_str(),
                failures_in_window = failures,
                cooldown_ms = self.cfg.cooldown.as_millis() as u64,
                "circuit opened"
            );
        }
        trip
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let st = self.lock();
        let open_remaining_ms = match (st.state, st.opened_at) {
            (CircuitState::Open, Some(at)) => {
                let elapsed = at.elapsed();
                if elapsed < self.cfg.cooldown {
                    Some((self.cfg.cooldown - elapsed).as_millis() as u64)
                } else {
                    None
                }
            }
            _ => None,
        };
        CircuitBreakerSnapshot {
            state: st.state,
            failure_threshold: self.cfg.failure_threshold,
            cooldown_ms: self.cfg.cooldown.as_millis() as u64,
            consecutive_failures: st
                .recent_failures
                .iter()
                .filter(|at| at.elapsed() <= self.cfg.window)
                .count() as u32,
            open_remaining_ms,
        }
    }
}

/// Lazily-populated map of breakers, one per [`EndpointKey`].
///
/// Entries live as long as the registry; failures on one key never affect another.
#[derive(Debug)]
pub struct CircuitRegistry {
    cfg: CircuitBreakerConfig,
    breakers: DashMap<EndpointKey, Arc<CircuitBreaker>>,
}

impl CircuitRegistry {
    pub fn new(cfg: CircuitBreakerConfig) -> Self {
        Self {
            cfg,
            breakers: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.cfg
    }

    pub fn breaker(&self, key: &EndpointKey) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(key) {
            return Arc::clone(existing.value());
        }
        self.breakers
            .entry(key.clone())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(key.to_string(), self.cfg.clone())))
            .value()
            .clone()
    }

    pub fn snapshot(&self, key: &EndpointKey) -> Option<CircuitBreakerSnapshot> {
        self.breakers.get(key).map(|b| b.value().snapshot())
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Forget all breaker state.
    pub fn reset(&self) {
        self.breakers.clear();
    }
}

impl Default for CircuitRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use std::thread;

    #[test]
    fn config_defaults() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.cooldown, Duration::from_secs(30));
    }

    #[test]
    fn threshold_is_at_least_one() {
        let config = CircuitBreakerConfig::new().with_failure_threshold(0);
        assert_eq!(config.failure_threshold, 1);
    }

    #[test]
    fn initial_state_is_closed() {
        let cb = CircuitBreaker::new("GET /people", CircuitBreakerConfig::default());
        assert_eq!(cb.allow().unwrap(), CircuitState::Closed);

        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert!(snapshot.open_remaining_ms.is_none());
    }

    #[test]
    fn success_resets_failures() {
        let cb = CircuitBreaker::new("x", CircuitBreakerConfig::new().with_failure_threshold(5));
        cb.on_failure();
        cb.on_failure();
        assert_eq!(cb.snapshot().consecutive_failures, 2);

        cb.on_success();
        assert_eq!(cb.snapshot().consecutive_failures, 0);
    }

    #[test]
    fn opens_at_threshold_and_fails_fast() {
        let cb = CircuitBreaker::new(
            "POST /invoices",
            CircuitBreakerConfig::new()
                .with_failure_threshold(3)
                .with_cooldown(Duration::from_secs(10)),
        );

        assert!(!cb.on_failure());
        assert!(!cb.on_failure());
        assert!(cb.allow().is_ok());

        assert!(cb.on_failure());
        let err = cb.allow().unwrap_err();
        match err {
            Error::CircuitOpen { endpoint, retry_in } => {
                assert_eq!(endpoint, "POST /invoices");
                assert!(retry_in <= Duration::from_secs(10));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(cb.snapshot().state, CircuitState::Open);
        assert!(cb.snapshot().open_remaining_ms.is_some());
    }

    #[test]
    fn half_open_after_cooldown_then_closes_on_success() {
        let cb = CircuitBreaker::new(
            "x",
            CircuitBreakerConfig::new()
                .with_failure_threshold(2)
                .with_cooldown(Duration::from_millis(50)),
        );
        cb.on_failure();
        cb.on_failure();
        assert!(cb.allow().is_err());

        thread::sleep(Duration::from_millis(60));

        assert_eq!(cb.allow().unwrap(), CircuitState::HalfOpen);
        cb.on_success();
        assert_eq!(cb.snapshot().state, CircuitState::Closed);
        assert_eq!(cb.snapshot().consecutive_failures, 0);
    }

    #[test]
    fn half_open_failure_reopens_immediately() {
        let cb = CircuitBreaker::new(
            "x",
            CircuitBreakerConfig::new()
                .with_failure_threshold(3)
                .with_cooldown(Duration::from_millis(30)),
        );
        for _ in 0..3 {
            cb.on_failure();
        }
        thread::sleep(Duration::from_millis(40));
        assert_eq!(cb.allow().unwrap(), CircuitState::HalfOpen);

        assert!(cb.on_failure());
        assert!(cb.allow().is_err());
    }

    #[test]
    fn failures_outside_window_do_not_accumulate() {
        let cb = CircuitBreaker::new(
            "x",
            CircuitBreakerConfig::new()
                .with_failure_threshold(2)
                .with_window(Duration::from_millis(20)),
        );
        cb.on_failure();
        thread::sleep(Duration::from_millis(40));
        assert!(!cb.on_failure());
        assert_eq!(cb.snapshot().consecutive_failures, 1);
        assert!(cb.allow().is_ok());
    }

    #[test]
    fn only_failures_inside_the_window_count() {
        let cb = CircuitBreaker::new(
            "GET /people/{id}",
            CircuitBreakerConfig::new()
                .with_failure_threshold(3)
                .with_window(Duration::from_millis(100)),
        );
        // Each gap is under the window, but no 100ms span holds three failures.
        assert!(!cb.on_failure());
        thread::sleep(Duration::from_millis(70));
        assert!(!cb.on_failure());
        thread::sleep(Duration::from_millis(70));
        assert!(!cb.on_failure());

        let snapshot = cb.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert!(snapshot.consecutive_failures <= 2);
        assert!(cb.allow().is_ok());
    }

    #[test]
    fn concurrent_failures_are_not_lost() {
        let cb = Arc::new(CircuitBreaker::new(
            "x",
            CircuitBreakerConfig::new().with_failure_threshold(100),
        ));

        let mut handles = vec![];
        for _ in 0..10 {
            let cb_clone = Arc::clone(&cb);
            handles.push(thread::spawn(move || {
                for _ in 0..5 {
                    cb_clone.on_failure();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(cb.snapshot().consecutive_failures, 50);
    }

    #[test]
    fn saturating_failures() {
        let cb = CircuitBreaker::new(
            "x",
            CircuitBreakerConfig::new().with_failure_threshold(u32::MAX),
        );
        for _ in 0..1000 {
            cb.on_failure();
        }
        assert_eq!(cb.snapshot().consecutive_failures, 1000);
    }

    #[test]
    fn registry_isolates_keys() {
        let registry = CircuitRegistry::new(CircuitBreakerConfig::new().with_failure_threshold(1));
        let people = EndpointKey::new(Method::GET, "/people");
        let contracts = EndpointKey::new(Method::GET, "/contracts");

        registry.breaker(&people).on_failure();
        assert!(registry.breaker(&people).allow().is_err());
        assert!(registry.breaker(&contracts).allow().is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_returns_shared_breaker_per_key() {
        let registry = CircuitRegistry::default();
        let key = EndpointKey::new(Method::POST, "/invoices");
        let a = registry.breaker(&key);
        let b = registry.breaker(&key);
        assert!(Arc::ptr_eq(&a, &b));

        a.on_failure();
        assert_eq!(registry.snapshot(&key).unwrap().consecutive_failures, 1);

        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.snapshot(&key).is_none());
    }
}
