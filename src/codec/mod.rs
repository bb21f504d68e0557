//! Envelope codec: decoding of the platform's response shapes.
//!
//! The transport returns raw bytes; callers pick the decode function that
//! matches the shape they expect.
//!
//! | Shape  | Wire form                                             | Decoder            |
//! |--------|-------------------------------------------------------|--------------------|
//! | Single | `{"data": T}`                                         | [`decode_single`]  |
//! | List   | `{"data": [T], "page": {"next": "...", "total": n}}`  | [`decode_list`]    |
//! | Raw    | opaque bytes (PDF, CSV, ...)                          | none, use as-is    |
//!
//! ```rust
//! use payroll_client::codec::{decode_single, FlexibleAmount};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct Invoice {
//!     id: String,
//!     total: FlexibleAmount,
//! }
//!
//! let invoice: Invoice = decode_single(br#"{"data":{"id":"inv_1","total":"80.00"}}"#).unwrap();
//! assert_eq!(invoice.total.value(), 80.0);
//! ```

pub mod amount;
pub mod envelope;
pub mod normalize;
pub mod pagination;
pub mod variant;

pub use amount::FlexibleAmount;
pub use envelope::{
    decode_list, decode_single, encode_single, platform_message, ListEnvelope, Page, PageInfo,
    Single,
};
pub use normalize::{decode_list_normalized, decode_single_normalized, Normalize};
pub use pagination::Paginator;
pub use variant::{DisplayValue, NamedRef, TextOrObject};
