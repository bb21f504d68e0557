//! Debug request logging: what the per-attempt line carries, and what it never does.

mod common;

use mockito::Server;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn subscriber(capture: &Capture) -> tracing::Dispatch {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("payroll_client=info"))
        .with_writer(capture.clone())
        .with_ansi(false)
        .finish();
    tracing::Dispatch::new(subscriber)
}

async fn ok_server() -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/people/p_1")
        .with_status(200)
        .with_body(r#"{"data":{"id":"p_1"}}"#)
        .create_async()
        .await;
    (server, mock)
}

#[tokio::test]
async fn debug_on_logs_method_path_and_status() {
    let capture = Capture::default();
    let _guard = tracing::dispatcher::set_default(&subscriber(&capture));
    let (server, _mock) = ok_server().await;

    let client = common::builder(&server.url()).debug(true).build().unwrap();
    client.get("/people/p_1").await.unwrap();

    let out = capture.contents();
    assert!(out.contains("payroll request"), "log output: {out}");
    assert!(out.contains("method=GET"), "log output: {out}");
    assert!(out.contains("/people/p_1"), "log output: {out}");
    assert!(out.contains("http_status=200"), "log output: {out}");
    assert!(!out.contains(common::TOKEN));
    assert!(!out.contains("Bearer"));
}

#[tokio::test]
async fn debug_off_logs_no_request_line() {
    let capture = Capture::default();
    let _guard = tracing::dispatcher::set_default(&subscriber(&capture));
    let (server, _mock) = ok_server().await;

    let client = common::builder(&server.url()).debug(false).build().unwrap();
    client.get("/people/p_1").await.unwrap();

    let out = capture.contents();
    assert!(!out.contains("payroll request"), "log output: {out}");
    assert!(!out.contains("/people/p_1"), "log output: {out}");
    assert!(!out.contains(common::TOKEN));
}

#[tokio::test]
async fn failed_calls_never_log_the_credential() {
    let capture = Capture::default();
    let _guard = tracing::dispatcher::set_default(&subscriber(&capture));
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/payslips/ps_9")
        .with_status(500)
        .with_body(r#"{"error":"upstream down"}"#)
        .expect(2)
        .create_async()
        .await;

    let client = common::builder(&server.url())
        .retry_policy(common::fast_retry(2))
        .debug(true)
        .build()
        .unwrap();
    let err = client.get("/payslips/ps_9").await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    let out = capture.contents();
    assert!(out.contains("http_status=500"), "log output: {out}");
    assert!(out.contains("retrying"), "log output: {out}");
    assert!(!out.contains(common::TOKEN));
    assert!(!out.contains("Bearer"));
}
