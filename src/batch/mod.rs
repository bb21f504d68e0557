//! Batch calls with a per-item fallback.
//!
//! Some platform versions expose bulk endpoints (`POST /people/bulk`), others
//! do not. [`BatchFallback`] tries the bulk call first and, when the platform
//! answers that the endpoint does not exist (404, 405 or 501), repeats the work
//! one item at a time through the regular single-item call.
//!
//! ```rust,no_run
//! use payroll_client::batch::BatchFallback;
//! use payroll_client::ApiClient;
//!
//! # async fn run(client: &ApiClient) -> payroll_client::Result<()> {
//! let ids = vec!["p_1".to_string(), "p_2".to_string()];
//! let result = BatchFallback::new()
//!     .run(
//!         &ids,
//!         |ids| async move {
//!             let body = client.post("/people/bulk_get", &serde_json::json!({ "ids": ids })).await?;
//!             Ok(payroll_client::codec::decode_list::<serde_json::Value>(&body)?.items)
//!         },
//!         |id| async move {
//!             let body = client.get(&format!("/people/{}", id)).await?;
//!             payroll_client::codec::decode_single::<serde_json::Value>(&body)
//!         },
//!     )
//!     .await?;
//! println!("{} ok, {} failed", result.success_count(), result.failure_count());
//! # Ok(())
//! # }
//! ```

mod executor;

pub use executor::{BatchFallback, BatchMode, BatchResult};
