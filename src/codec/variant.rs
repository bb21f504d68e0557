//! Fields that the platform sends either as a bare string or as an object.

use serde::{Deserialize, Serialize};

/// Anything that can produce a human-readable label.
pub trait DisplayValue {
    fn display_value(&self) -> &str;
}

/// Reference object with an optional id and a name, e.g. `{"id": "d1", "name": "Finance"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl DisplayValue for NamedRef {
    fn display_value(&self) -> &str {
        &self.name
    }
}

/// A field that is sometimes `"Finance"` and sometimes `{"id": "d1", "name": "Finance"}`.
///
/// Decoding tries the text form first, then the structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrObject<T = NamedRef> {
    Text(String),
    Object(T),
}

impl<T: DisplayValue> TextOrObject<T> {
    /// Label to show regardless of which form arrived.
    pub fn display_value(&self) -> &str {
        match self {
            TextOrObject::Text(s) => s.as_str(),
            TextOrObject::Object(obj) => obj.display_value(),
        }
    }
}

impl<T> TextOrObject<T> {
    pub fn as_object(&self) -> Option<&T> {
        match self {
            TextOrObject::Object(obj) => Some(obj),
            TextOrObject::Text(_) => None,
        }
    }
}

impl<T> Default for TextOrObject<T> {
    fn default() -> Self {
        TextOrObject::Text(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Person {
        department: TextOrObject,
    }

    #[test]
    fn text_form() {
        let p: Person = serde_json::from_str(r#"{"department":"Finance"}"#).unwrap();
        assert_eq!(p.department.display_value(), "Finance");
        assert!(p.department.as_object().is_none());
    }

    #[test]
    fn object_form() {
        let p: Person =
            serde_json::from_str(r#"{"department":{"id":"dep_4","name":"Engineering"}}"#).unwrap();
        assert_eq!(p.department.display_value(), "Engineering");
        assert_eq!(
            p.department.as_object().and_then(|d| d.id.as_deref()),
            Some("dep_4")
        );
    }

    #[test]
    fn object_without_name_displays_empty() {
        let p: Person = serde_json::from_str(r#"{"department":{"id":"dep_4"}}"#).unwrap();
        assert_eq!(p.department.display_value(), "");
    }
}
