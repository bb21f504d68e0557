//! Caller cancellation, deadlines and per-attempt timeouts.

mod common;

use mockito::Server;
use payroll_client::{CallOptions, CancelReason, CancellationToken, Error, RequestSpec, RetryPolicy};
use std::time::{Duration, Instant};

fn cancel_after(token: &CancellationToken, delay: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        token.cancel();
    });
}

#[tokio::test]
async fn cancel_during_backoff_returns_promptly() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/people")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let client = common::builder(&server.url())
        .retry_policy(
            RetryPolicy::new()
                .with_max_attempts(5)
                .with_base_delay(Duration::from_secs(10))
                .with_max_delay(Duration::from_secs(10))
                .with_jitter(Duration::ZERO),
        )
        .build()
        .unwrap();

    let token = CancellationToken::new();
    cancel_after(&token, Duration::from_millis(100));

    let started = Instant::now();
    let err = client
        .execute(RequestSpec::get("/people").cancel_token(token))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Canceled {
            reason: CancelReason::Caller
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(2));
    mock.assert_async().await;
}

#[tokio::test]
async fn already_canceled_call_does_not_touch_the_breaker() {
    let server = common::SilentServer::start().await;
    let client = common::client(&server.url);
    let token = CancellationToken::new();
    token.cancel();

    let err = client
        .get_with("/people", CallOptions::new().with_cancel(token))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Canceled { .. }));
    let snap = client
        .breaker_snapshot(reqwest::Method::GET, "/people")
        .unwrap();
    assert_eq!(snap.consecutive_failures, 0);
}

#[tokio::test]
async fn cancel_aborts_in_flight_request() {
    let server = common::SilentServer::start().await;
    let client = common::client(&server.url);
    let token = CancellationToken::new();
    cancel_after(&token, Duration::from_millis(100));

    let started = Instant::now();
    let err = client
        .get_with("/people", CallOptions::new().with_cancel(token))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Canceled {
            reason: CancelReason::Caller
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn deadline_bounds_the_whole_call() {
    let server = common::SilentServer::start().await;
    let client = common::client(&server.url);

    let started = Instant::now();
    let err = client
        .get_with(
            "/people",
            CallOptions::new().with_timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Canceled {
            reason: CancelReason::Deadline
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn attempt_timeout_is_retried_as_network_error() {
    let server = common::SilentServer::start().await;
    let client = common::builder(&server.url)
        .retry_policy(common::fast_retry(2))
        .attempt_timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client.get("/people").await.unwrap_err();
    match &err {
        Error::Network { timeout, .. } => assert!(*timeout),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());
    assert_eq!(server.connection_count(), 2);
}
