//! Post-decode normalization.
//!
//! Some resources carry fields derived from others (a display name built from
//! first and last name, for instance). Those are filled by an explicit
//! [`Normalize::normalize`] pass that runs once, after raw parsing.

use super::envelope::{decode_list, decode_single, Page};
use crate::Result;
use serde::de::DeserializeOwned;

pub trait Normalize {
    fn normalize(&mut self);
}

/// [`decode_single`] followed by one [`Normalize::normalize`] call.
pub fn decode_single_normalized<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Default + Normalize,
{
    let mut value: T = decode_single(bytes)?;
    value.normalize();
    Ok(value)
}

/// [`decode_list`] followed by normalization of every item.
pub fn decode_list_normalized<T>(bytes: &[u8]) -> Result<Page<T>>
where
    T: DeserializeOwned + Normalize,
{
    let mut page: Page<T> = decode_list(bytes)?;
    page.items.iter_mut().for_each(|item| item.normalize());
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Worker {
        #[serde(default)]
        first_name: String,
        #[serde(default)]
        last_name: String,
        #[serde(skip)]
        full_name: String,
    }

    impl Normalize for Worker {
        fn normalize(&mut self) {
            self.full_name = format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string();
        }
    }

    #[test]
    fn derives_full_name_after_decode() {
        let w: Worker =
            decode_single_normalized(br#"{"data":{"first_name":"Ada","last_name":"Lovelace"}}"#)
                .unwrap();
        assert_eq!(w.full_name, "Ada Lovelace");
    }

    #[test]
    fn raw_decode_leaves_derived_field_empty() {
        let w: Worker =
            decode_single(br#"{"data":{"first_name":"Ada","last_name":"Lovelace"}}"#).unwrap();
        assert_eq!(w.full_name, "");
    }

    #[test]
    fn list_items_are_each_normalized() {
        let page: Page<Worker> = decode_list_normalized(
            br#"{"data":[{"first_name":"Grace"},{"first_name":"Alan","last_name":"Turing"}]}"#,
        )
        .unwrap();
        let names: Vec<&str> = page.items.iter().map(|w| w.full_name.as_str()).collect();
        assert_eq!(names, vec!["Grace", "Alan Turing"]);
    }
}
