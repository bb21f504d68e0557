//! Monetary amounts that arrive either as JSON strings or JSON numbers.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An amount that the platform may send as `"80.00"` or `80.00`.
///
/// Both forms decode to the same `f64`. Request bodies should format amounts
/// explicitly (see [`FlexibleAmount::to_fixed`]) instead of relying on the
/// `Serialize` impl, which emits a bare JSON number.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct FlexibleAmount(f64);

impl FlexibleAmount {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fixed-point rendering, e.g. `to_fixed(2)` gives `"80.00"`.
    pub fn to_fixed(&self, decimals: usize) -> String {
        format!("{:.*}", decimals, self.0)
    }
}

impl From<f64> for FlexibleAmount {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<FlexibleAmount> for f64 {
    fn from(value: FlexibleAmount) -> Self {
        value.0
    }
}

impl fmt::Display for FlexibleAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for FlexibleAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = FlexibleAmount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok(FlexibleAmount(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(FlexibleAmount(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(FlexibleAmount(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        let trimmed = v.trim();
        let parsed: f64 = trimmed
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))?;
        if !parsed.is_finite() {
            return Err(E::invalid_value(de::Unexpected::Str(v), &self));
        }
        Ok(FlexibleAmount(parsed))
    }
}

impl<'de> Deserialize<'de> for FlexibleAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_and_number_decode_identically() {
        let from_str: FlexibleAmount = serde_json::from_str("\"80.00\"").unwrap();
        let from_num: FlexibleAmount = serde_json::from_str("80.00").unwrap();
        assert_eq!(from_str.value(), 80.0);
        assert_eq!(from_num.value(), 80.0);
        assert_eq!(from_str, from_num);
    }

    #[test]
    fn integers_and_padded_strings() {
        let int: FlexibleAmount = serde_json::from_str("1200").unwrap();
        let neg: FlexibleAmount = serde_json::from_str("-15").unwrap();
        let padded: FlexibleAmount = serde_json::from_str("\" 19.5 \"").unwrap();
        assert_eq!(int.value(), 1200.0);
        assert_eq!(neg.value(), -15.0);
        assert_eq!(padded.value(), 19.5);
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(serde_json::from_str::<FlexibleAmount>("\"eighty\"").is_err());
        assert!(serde_json::from_str::<FlexibleAmount>("\"\"").is_err());
        assert!(serde_json::from_str::<FlexibleAmount>("\"NaN\"").is_err());
        assert!(serde_json::from_str::<FlexibleAmount>("true").is_err());
    }

    #[test]
    fn optional_amount_accepts_null() {
        #[derive(Deserialize)]
        struct Line {
            amount: Option<FlexibleAmount>,
        }
        let line: Line = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        assert!(line.amount.is_none());
    }

    #[test]
    fn explicit_formatting_for_writes() {
        assert_eq!(FlexibleAmount::new(80.0).to_fixed(2), "80.00");
        assert_eq!(FlexibleAmount::new(3.14159).to_fixed(3), "3.142");
    }
}
