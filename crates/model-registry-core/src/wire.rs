//! Serde helpers for wire quirks
//!
//! The registry serialises 64-bit integers (ids aside, mostly epoch
//! milliseconds and metadata ints) as decimal strings. Readers accept both
//! the string form and a bare JSON number.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Int64Repr {
    Number(i64),
    Text(String),
}

impl Int64Repr {
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Int64Repr::Number(n) => Ok(n),
            Int64Repr::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid int64 string: {s:?}"))),
        }
    }
}

/// `i64` written as a decimal string
pub mod int64_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Int64Repr::deserialize(deserializer)?.into_i64()
    }
}

/// `Option<i64>` written as a decimal string when present
pub mod opt_int64_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Option::<Int64Repr>::deserialize(deserializer)?
            .map(Int64Repr::into_i64)
            .transpose()
    }
}

/// Convert server epoch milliseconds into a UTC timestamp
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Current time as epoch milliseconds
pub fn now_epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stamp {
        #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
        at: Option<i64>,
        #[serde(with = "int64_string")]
        step: i64,
    }

    #[test]
    fn test_reads_string_and_number_forms() {
        let a: Stamp = serde_json::from_str(r#"{"at":"1700000000000","step":3}"#).unwrap();
        let b: Stamp = serde_json::from_str(r#"{"at":1700000000000,"step":"3"}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.at, Some(1_700_000_000_000));
    }

    #[test]
    fn test_writes_string_form() {
        let json = serde_json::to_value(Stamp { at: None, step: 7 }).unwrap();
        assert_eq!(json, serde_json::json!({"step": "7"}));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Stamp>(r#"{"step":"seven"}"#).is_err());
    }

    #[test]
    fn test_epoch_conversion() {
        let ts = from_epoch_millis(1_700_000_000_123).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_123);
    }
}
