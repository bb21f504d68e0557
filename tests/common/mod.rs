//! Shared fixtures for integration tests.
#![allow(dead_code)]

use payroll_client::resilience::CircuitBreakerConfig;
use payroll_client::{ApiClient, ApiClientBuilder, RetryPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const TOKEN: &str = "tok_test_123";

/// Retries with short, jitter-free delays so tests stay fast.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(max_attempts)
        .with_base_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_millis(50))
        .with_jitter(Duration::ZERO)
}

pub fn builder(base_url: &str) -> ApiClientBuilder {
    ApiClientBuilder::new()
        .base_url(base_url)
        .credential(TOKEN)
        .retry_policy(fast_retry(3))
        .circuit_breaker(CircuitBreakerConfig::new().with_failure_threshold(50))
}

pub fn client(base_url: &str) -> ApiClient {
    builder(base_url).build().expect("client builds")
}

/// A server that accepts connections and never answers.
pub struct SilentServer {
    pub url: String,
    connections: Arc<AtomicUsize>,
}

impl SilentServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        });
        Self {
            url: format!("http://{}", addr),
            connections,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}
