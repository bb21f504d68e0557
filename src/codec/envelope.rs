//! `{data: T}` and `{data: [T], page: {...}}` envelopes.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Single-item envelope: `{"data": T}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Single<T> {
    pub data: T,
}

/// Cursor block of a list response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Opaque cursor for the next page; empty when this is the last page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub next: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
}

/// List envelope: `{"data": [T], "page": {"next": "...", "total": n}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListEnvelope<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<T>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: PageInfo,
}

/// One decoded page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn next_cursor(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
            total: self.total,
        }
    }
}

impl<T> From<ListEnvelope<T>> for Page<T> {
    fn from(env: ListEnvelope<T>) -> Self {
        let next = env.page.next.trim();
        Page {
            next: if next.is_empty() {
                None
            } else {
                Some(next.to_string())
            },
            total: env.page.total,
            items: env.data,
        }
    }
}

fn null_as_default<'de, D, V>(deserializer: D) -> std::result::Result<V, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de> + Default,
{
    Ok(Option::<V>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
struct SingleIn<T> {
    data: Option<T>,
}

/// Decode `{"data": T}`.
///
/// An absent or null `data` yields `T::default()` rather than an error.
pub fn decode_single<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let env: SingleIn<T> = serde_json::from_slice(bytes).map_err(|e| Error::decode(e, bytes))?;
    Ok(env.data.unwrap_or_default())
}

/// Decode a list envelope into a [`Page`].
///
/// `data: null` gives an empty page; an absent `page` gives no cursor and a zero total.
pub fn decode_list<T>(bytes: &[u8]) -> Result<Page<T>>
where
    T: DeserializeOwned,
{
    let env: ListEnvelope<T> =
        serde_json::from_slice(bytes).map_err(|e| Error::decode(e, bytes))?;
    Ok(env.into())
}

/// Encode a value as `{"data": value}`.
pub fn encode_single<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(&Single { data: value }).map_err(|e| Error::decode(e, &[]))
}

/// Extract the message of a platform error body.
///
/// Recognizes `{"error": "msg"}`, `{"error": {"message": "msg"}}` and
/// `{"errors": [{"message": "msg"}, ...]}`.
pub fn platform_message(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    let msg = match value.get("error") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(obj @ serde_json::Value::Object(_)) => obj
            .get("message")
            .and_then(|m| m.as_str())
            .map(|s| s.to_string()),
        _ => value
            .get("errors")
            .and_then(|e| e.as_array())
            .and_then(|errs| errs.first())
            .and_then(|first| first.get("message"))
            .and_then(|m| m.as_str())
            .map(|s| s.to_string()),
    };
    msg.filter(|m| !m.trim().is_empty())
}
