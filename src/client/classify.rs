//! Error classification: completed responses and transport failures to [`Error`].
//!
//! Pure functions only; nothing here performs I/O.

use crate::{Error, ErrorContext};
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Classify a completed response. `None` means success (2xx).
///
/// | Status | Result |
/// |--------|--------|
/// | 2xx | success |
/// | 401, 403 | [`Error::Auth`] |
/// | 404 | [`Error::NotFound`] |
/// | 429 | [`Error::RateLimited`] (retryable) |
/// | 5xx | [`Error::Server`] (retryable) |
/// | anything else | [`Error::Validation`] |
pub fn classify_response(status: u16, retry_after: Option<Duration>, body: &[u8]) -> Option<Error> {
    if (200..300).contains(&status) {
        return None;
    }
    let body = String::from_utf8_lossy(body).into_owned();
    Some(match status {
        401 | 403 => Error::Auth { status, body },
        404 => Error::NotFound { status, body },
        429 => Error::RateLimited {
            status,
            body,
            retry_after,
        },
        500..=599 => Error::Server { status, body },
        _ => Error::Validation { status, body },
    })
}

/// Classify a transport-level failure (connect refused, reset, timeout, ...).
///
/// A request that could not be built (an invalid header value, say) never
/// left the process, so it is a [`Error::Configuration`] rather than a
/// retryable network failure.
pub fn classify_transport(err: &reqwest::Error) -> Error {
    if err.is_builder() {
        return Error::configuration_with_context(
            format!("cannot build request: {}", err),
            ErrorContext::new().with_source("request_executor"),
        );
    }
    let timeout = err.is_timeout();
    let message = if timeout {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    Error::network(message, timeout)
}

/// Extract the first non-empty value among `names`.
pub(crate) fn header_first(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(v) = headers.get(*name) {
            if let Ok(s) = v.to_str() {
                let s = s.trim();
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

/// Best-effort parsing of `Retry-After`.
///
/// Only the `Retry-After: <seconds>` form is supported.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = header_first(headers, &["retry-after"])?;
    let secs: u64 = raw.parse().ok()?;
    Some(Duration::from_secs(secs))
}
