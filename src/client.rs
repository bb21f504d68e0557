//! Transport client for the payroll platform.
//!
//! [`ApiClient`] is the entry point. Every call goes through the request
//! executor: breaker gate, attempt, classification, backoff, repeat.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod classify;
pub mod core;
pub mod endpoint;
mod execution;
pub mod multipart;
pub mod request;

pub use builder::ApiClientBuilder;
pub use core::ApiClient;
pub use endpoint::EndpointKey;
pub use multipart::{MultipartBuilder, MultipartForm};
pub use request::{CallOptions, RequestBody, RequestSpec};
