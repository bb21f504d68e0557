use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Structured context for configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Configuration key that caused the error (e.g., "base_url", "retry.max_attempts")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "config_env")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Classification of a failed call.
///
/// The string form (`as_str`) is stable and is what appears in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 4xx other than 401/403/404/429
    Validation,
    /// 401 or 403
    Auth,
    /// 404
    NotFound,
    /// 429
    RateLimited,
    /// 5xx
    Server,
    /// Connection-level failure or per-attempt timeout
    Network,
    /// Caller cancellation or overall deadline
    Canceled,
    /// Endpoint is failing fast
    CircuitOpen,
    /// Malformed response payload
    Decode,
    /// Invalid client configuration
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Server => "server_error",
            Self::Network => "network",
            Self::Canceled => "canceled",
            Self::CircuitOpen => "circuit_open",
            Self::Decode => "decode",
            Self::Configuration => "configuration",
        }
    }

    /// Whether an attempt that failed with this kind may be repeated.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Server | Self::Network)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a call stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation token fired.
    Caller,
    /// The caller's overall deadline passed.
    Deadline,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caller => f.write_str("canceled by caller"),
            Self::Deadline => f.write_str("deadline exceeded"),
        }
    }
}

/// Unified error type for the payroll client.
///
/// Every failed logical call yields exactly one of these. HTTP-derived variants
/// keep the original status code and the raw response body.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: HTTP {status}{}", format_body(.body))]
    Validation { status: u16, body: String },

    #[error("Authentication error: HTTP {status}{}", format_body(.body))]
    Auth { status: u16, body: String },

    #[error("Not found: HTTP {status}{}", format_body(.body))]
    NotFound { status: u16, body: String },

    #[error("Rate limited: HTTP {status}{}", format_body(.body))]
    RateLimited {
        status: u16,
        body: String,
        retry_after: Option<Duration>,
    },

    #[error("Server error: HTTP {status}{}", format_body(.body))]
    Server { status: u16, body: String },

    #[error("Network error: {message}")]
    Network { message: String, timeout: bool },

    #[error("Request canceled: {reason}")]
    Canceled { reason: CancelReason },

    #[error("Circuit open for {endpoint} (retry in {}ms)", .retry_in.as_millis())]
    CircuitOpen { endpoint: String, retry_in: Duration },

    #[error("Envelope decode error: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },
}

fn format_body(body: &str) -> String {
    match crate::codec::envelope::platform_message(body.as_bytes()) {
        Some(msg) => format!(": {}", msg),
        None => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                String::new()
            } else {
                let snippet: String = trimmed.chars().take(200).collect();
                format!(": {}", snippet)
            }
        }
    }
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub(crate) fn decode(source: serde_json::Error, bytes: &[u8]) -> Self {
        Error::Decode {
            source,
            body: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    pub(crate) fn network(message: impl Into<String>, timeout: bool) -> Self {
        Error::Network {
            message: message.into(),
            timeout,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Auth { .. } => ErrorKind::Auth,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::Server { .. } => ErrorKind::Server,
            Error::Network { .. } => ErrorKind::Network,
            Error::Canceled { .. } => ErrorKind::Canceled,
            Error::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().retryable()
    }

    /// HTTP status of the response that produced this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Validation { status, .. }
            | Error::Auth { status, .. }
            | Error::NotFound { status, .. }
            | Error::RateLimited { status, .. }
            | Error::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body as received.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Validation { body, .. }
            | Error::Auth { body, .. }
            | Error::NotFound { body, .. }
            | Error::RateLimited { body, .. }
            | Error::Server { body, .. }
            | Error::Decode { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    /// The platform's `{"error": "<message>"}` text, when the body carries one.
    pub fn message(&self) -> Option<String> {
        self.body()
            .and_then(|b| crate::codec::envelope::platform_message(b.as_bytes()))
    }

    /// Server-provided retry hint (429 only).
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}
