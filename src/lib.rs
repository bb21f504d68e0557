//! # payroll-client
//!
//! Resilient transport layer for a remote HR and payroll REST platform.
//!
//! ## Overview
//!
//! Every call made through [`ApiClient`] is authenticated with a bearer
//! credential, guarded by a per-endpoint circuit breaker, retried with
//! exponential backoff when the failure is transient and the request is safe
//! to repeat, and classified into a single [`Error`] taxonomy when it fails.
//! Responses come back as raw bytes; the [`codec`] module decodes the
//! platform's `{"data": ...}` envelopes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use payroll_client::codec::{decode_list, decode_single};
//! use payroll_client::ApiClientBuilder;
//!
//! #[derive(Debug, Default, serde::Deserialize)]
//! struct Person {
//!     id: String,
//!     full_name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> payroll_client::Result<()> {
//!     let client = ApiClientBuilder::new()
//!         .base_url("https://api.payroll.example/rest/v2")
//!         .credential("tok_live_xxx")
//!         .build()?;
//!
//!     let person: Person = decode_single(&client.get("/people/p_42").await?)?;
//!     println!("{}", person.full_name);
//!
//!     let everyone = client
//!         .paginate("/people", decode_list::<Person>)
//!         .collect_items()
//!         .await?;
//!     println!("{} people", everyone.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Transport client, request descriptors, classifier, executor |
//! | [`codec`] | Envelope decoding, flexible amounts, pagination |
//! | [`resilience`] | Circuit breaker registry and retry policy |
//! | [`secret`] | Redacting credential wrapper |
//! | [`config`] | YAML and environment configuration |
//! | [`batch`] | Bulk calls with per-item fallback |
//! | [`error`] | Error taxonomy |

pub mod batch;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod resilience;
pub mod secret;

pub use client::{
    ApiClient, ApiClientBuilder, CallOptions, EndpointKey, MultipartForm, RequestBody,
    RequestSpec,
};
pub use codec::{FlexibleAmount, Page, Paginator, TextOrObject};
pub use config::ClientConfig;
pub use error::{CancelReason, Error, ErrorContext, ErrorKind};
pub use resilience::{CircuitBreakerSnapshot, CircuitState, RetryPolicy};
pub use secret::Credential;

pub use tokio_util::sync::CancellationToken;

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A pinned, boxed stream of `Result<T>`.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;
