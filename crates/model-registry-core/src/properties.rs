//! Custom-property codec
//!
//! Every registry and catalog entity carries a `customProperties` map whose
//! values travel as tagged envelopes:
//!
//! ```text
//! { "accuracy": { "float_value": 0.91, "metadataType": "MetadataFloatValue" } }
//! ```
//!
//! Calling code works with plain [`PropertyValue`]s instead. [`PropertyCodec`]
//! is the single place where the two forms are converted, so every adapter
//! shares one encode policy and one decode policy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{CodecError, CodecResult};
use crate::wire::int64_string;

/// Wire tag for string values
pub const METADATA_STRING: &str = "MetadataStringValue";
/// Wire tag for integer values
pub const METADATA_INT: &str = "MetadataIntValue";
/// Wire tag for floating point values
pub const METADATA_FLOAT: &str = "MetadataFloatValue";
/// Alternate floating point tag accepted on decode
pub const METADATA_DOUBLE: &str = "MetadataDoubleValue";
/// Wire tag for boolean values
pub const METADATA_BOOL: &str = "MetadataBoolValue";

const TYPE_FIELD: &str = "metadataType";
const CUSTOM_PROPERTIES_FIELD: &str = "customProperties";
const VALUE_FIELDS: [&str; 5] = [
    "string_value",
    "int_value",
    "float_value",
    "double_value",
    "bool_value",
];

/// A plain custom-property value as seen by calling code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Borrow the string payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert a JSON scalar. `null` maps to `None`; arrays and objects are
    /// rejected.
    pub fn from_json(key: &str, value: &Value) -> CodecResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(PropertyValue::Bool(*b))),
            Value::String(s) => Ok(Some(PropertyValue::String(s.clone()))),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Some(PropertyValue::Int(i))),
                None => n
                    .as_f64()
                    .map(|f| Some(PropertyValue::Float(f)))
                    .ok_or_else(|| CodecError::UnsupportedValue {
                        key: key.to_string(),
                        kind: "number",
                    }),
            },
            other => Err(CodecError::UnsupportedValue {
                key: key.to_string(),
                kind: json_kind(other),
            }),
        }
    }

    /// Plain JSON form. Non-finite floats become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Int(i) => Value::Number((*i).into()),
            PropertyValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            PropertyValue::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// Plain property map keyed by property name
pub type Properties = BTreeMap<String, PropertyValue>;

/// Wire-level tagged envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metadataType")]
pub enum MetadataValue {
    #[serde(rename = "MetadataStringValue")]
    String { string_value: String },
    #[serde(rename = "MetadataIntValue")]
    Int {
        #[serde(with = "int64_string")]
        int_value: i64,
    },
    #[serde(rename = "MetadataFloatValue")]
    Float { float_value: f64 },
    #[serde(rename = "MetadataBoolValue")]
    Bool { bool_value: bool },
}

impl MetadataValue {
    /// The `metadataType` tag this envelope is written with
    pub fn metadata_type(&self) -> &'static str {
        match self {
            MetadataValue::String { .. } => METADATA_STRING,
            MetadataValue::Int { .. } => METADATA_INT,
            MetadataValue::Float { .. } => METADATA_FLOAT,
            MetadataValue::Bool { .. } => METADATA_BOOL,
        }
    }

    /// Unwrap into the plain value
    pub fn into_plain(self) -> PropertyValue {
        match self {
            MetadataValue::String { string_value } => PropertyValue::String(string_value),
            MetadataValue::Int { int_value } => PropertyValue::Int(int_value),
            MetadataValue::Float { float_value } => PropertyValue::Float(float_value),
            MetadataValue::Bool { bool_value } => PropertyValue::Bool(bool_value),
        }
    }
}

impl From<PropertyValue> for MetadataValue {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::String(string_value) => MetadataValue::String { string_value },
            PropertyValue::Int(int_value) => MetadataValue::Int { int_value },
            PropertyValue::Float(float_value) => MetadataValue::Float { float_value },
            PropertyValue::Bool(bool_value) => MetadataValue::Bool { bool_value },
        }
    }
}

/// Wire property map keyed by property name
pub type CustomProperties = BTreeMap<String, MetadataValue>;

/// How plain values are written on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    /// Each primitive keeps its own `metadataType`
    #[default]
    Typed,
    /// Every primitive is rendered as text under `MetadataStringValue`
    Stringify,
}

/// How malformed or unknown envelopes are handled on read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// The first malformed envelope fails the whole decode
    Strict,
    /// Unknown tags fall back to `string_value`; unusable entries are
    /// skipped with a warning
    #[default]
    Lenient,
}

/// Bidirectional converter between plain and wire property maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyCodec {
    encode_mode: EncodeMode,
    decode_mode: DecodeMode,
}

impl PropertyCodec {
    /// Typed encoding, lenient decoding
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed encoding, strict decoding
    pub fn strict() -> Self {
        Self {
            encode_mode: EncodeMode::Typed,
            decode_mode: DecodeMode::Strict,
        }
    }

    pub fn with_encode_mode(mut self, mode: EncodeMode) -> Self {
        self.encode_mode = mode;
        self
    }

    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }

    pub fn encode_mode(&self) -> EncodeMode {
        self.encode_mode
    }

    pub fn decode_mode(&self) -> DecodeMode {
        self.decode_mode
    }

    /// Encode plain entries into wire envelopes.
    ///
    /// `None` values are dropped. Returns `Ok(None)` when nothing is left so
    /// that request bodies omit `customProperties` instead of sending `{}`.
    pub fn encode<I, K, V>(&self, plain: I) -> CodecResult<Option<CustomProperties>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<PropertyValue>>,
    {
        let mut wire = CustomProperties::new();
        for (key, value) in plain {
            let key = key.into();
            let value: Option<PropertyValue> = value.into();
            let Some(value) = value else {
                continue;
            };
            let envelope = self.encode_value(&key, value)?;
            wire.insert(key, envelope);
        }
        Ok((!wire.is_empty()).then_some(wire))
    }

    /// Encode a borrowed plain map
    pub fn encode_properties(&self, plain: &Properties) -> CodecResult<Option<CustomProperties>> {
        self.encode(plain.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// Encode a plain JSON object (`null` members are dropped)
    pub fn encode_json(&self, plain: &Map<String, Value>) -> CodecResult<Option<CustomProperties>> {
        let mut entries = Vec::with_capacity(plain.len());
        for (key, value) in plain {
            entries.push((key.clone(), PropertyValue::from_json(key, value)?));
        }
        self.encode(entries)
    }

    /// Encode to wire envelopes as JSON, ready to be spliced into a
    /// `customProperties` object fetched raw from the server
    pub fn encode_envelopes(&self, plain: &Properties) -> CodecResult<Map<String, Value>> {
        Ok(self
            .encode_properties(plain)?
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, envelope_to_json(v)))
            .collect())
    }

    fn encode_value(&self, key: &str, value: PropertyValue) -> CodecResult<MetadataValue> {
        match self.encode_mode {
            EncodeMode::Typed => match value {
                PropertyValue::Float(f) if !f.is_finite() => Err(CodecError::NonFiniteFloat {
                    key: key.to_string(),
                }),
                other => Ok(MetadataValue::from(other)),
            },
            EncodeMode::Stringify => Ok(MetadataValue::String {
                string_value: value.to_string(),
            }),
        }
    }

    /// Decode a wire `customProperties` object into plain values.
    ///
    /// Entries are visited in key order; in strict mode the first failure is
    /// returned and names its key. `null` decodes to an empty map.
    pub fn decode(&self, wire: &Value) -> CodecResult<Properties> {
        let entries = match wire {
            Value::Null => return Ok(Properties::new()),
            Value::Object(entries) => entries,
            other => return Err(CodecError::NotAnObject(json_kind(other))),
        };

        let mut plain = Properties::new();
        for (key, envelope) in entries {
            match self.decode_entry(key, envelope) {
                Ok(value) => {
                    plain.insert(key.clone(), value);
                }
                Err(e) if self.decode_mode == DecodeMode::Lenient => {
                    warn!(key = %key, error = %e, "Skipping undecodable custom property");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(plain)
    }

    fn decode_entry(&self, key: &str, envelope: &Value) -> CodecResult<PropertyValue> {
        let fields = envelope
            .as_object()
            .ok_or_else(|| CodecError::MalformedEnvelope {
                key: key.to_string(),
            })?;

        let metadata_type = match fields.get(TYPE_FIELD) {
            Some(Value::String(t)) => t.as_str(),
            _ => {
                if self.decode_mode == DecodeMode::Lenient {
                    if let Some(value) = infer_untagged(key, fields) {
                        debug!(key = %key, "Inferred custom property type from value field");
                        return value;
                    }
                }
                return Err(CodecError::MissingType {
                    key: key.to_string(),
                });
            }
        };

        match metadata_type {
            METADATA_STRING => read_string(key, metadata_type, fields),
            METADATA_INT => read_int(key, metadata_type, fields),
            METADATA_FLOAT | METADATA_DOUBLE => read_float(key, metadata_type, fields),
            METADATA_BOOL => read_bool(key, metadata_type, fields),
            other => {
                let unknown = CodecError::UnknownType {
                    key: key.to_string(),
                    metadata_type: other.to_string(),
                };
                if self.decode_mode == DecodeMode::Strict {
                    return Err(unknown);
                }
                match fields.get("string_value") {
                    Some(Value::String(s)) => {
                        warn!(
                            key = %key,
                            metadata_type = %other,
                            "Unknown metadataType, reading string_value"
                        );
                        Ok(PropertyValue::String(s.clone()))
                    }
                    _ => Err(unknown),
                }
            }
        }
    }

    /// Replace `customProperties` (top level, and inside every element of an
    /// `items` array) with its decoded plain form.
    pub fn decode_in_place(&self, body: &mut Value) -> CodecResult<()> {
        let Some(object) = body.as_object_mut() else {
            return Ok(());
        };
        self.decode_member(object)?;
        if let Some(Value::Array(items)) = object.get_mut("items") {
            for item in items.iter_mut() {
                if let Some(item) = item.as_object_mut() {
                    self.decode_member(item)?;
                }
            }
        }
        Ok(())
    }

    fn decode_member(&self, object: &mut Map<String, Value>) -> CodecResult<()> {
        if let Some(wire) = object.get_mut(CUSTOM_PROPERTIES_FIELD) {
            let plain = self.decode(wire)?;
            *wire = Value::Object(plain.iter().map(|(k, v)| (k.clone(), v.to_json())).collect());
        }
        Ok(())
    }

    /// Replace a plain `customProperties` member of an outbound body with
    /// wire envelopes, or remove it when nothing would be sent.
    pub fn encode_in_place(&self, body: &mut Value) -> CodecResult<()> {
        let Some(object) = body.as_object_mut() else {
            return Ok(());
        };
        let encoded = match object.get(CUSTOM_PROPERTIES_FIELD) {
            None => return Ok(()),
            Some(Value::Null) => None,
            Some(Value::Object(plain)) => self.encode_json(plain)?,
            Some(other) => return Err(CodecError::NotAnObject(json_kind(other))),
        };
        match encoded {
            Some(wire) => {
                let wire = wire
                    .into_iter()
                    .map(|(k, v)| (k, envelope_to_json(v)))
                    .collect();
                object.insert(CUSTOM_PROPERTIES_FIELD.to_string(), Value::Object(wire));
            }
            None => {
                object.remove(CUSTOM_PROPERTIES_FIELD);
            }
        }
        Ok(())
    }
}

fn envelope_to_json(value: MetadataValue) -> Value {
    let metadata_type = value.metadata_type();
    let (field, payload) = match value {
        MetadataValue::String { string_value } => ("string_value", Value::String(string_value)),
        MetadataValue::Int { int_value } => ("int_value", Value::String(int_value.to_string())),
        MetadataValue::Float { float_value } => (
            "float_value",
            Number::from_f64(float_value).map(Value::Number).unwrap_or(Value::Null),
        ),
        MetadataValue::Bool { bool_value } => ("bool_value", Value::Bool(bool_value)),
    };
    let mut envelope = Map::new();
    envelope.insert(field.to_string(), payload);
    envelope.insert(TYPE_FIELD.to_string(), Value::String(metadata_type.to_string()));
    Value::Object(envelope)
}

fn infer_untagged(key: &str, fields: &Map<String, Value>) -> Option<CodecResult<PropertyValue>> {
    let mut present = VALUE_FIELDS.iter().filter(|f| fields.contains_key(**f));
    let field = *present.next()?;
    if present.next().is_some() {
        return None;
    }
    Some(match field {
        "string_value" => read_string(key, METADATA_STRING, fields),
        "int_value" => read_int(key, METADATA_INT, fields),
        "bool_value" => read_bool(key, METADATA_BOOL, fields),
        _ => read_float(key, METADATA_FLOAT, fields),
    })
}

fn missing(key: &str, metadata_type: &str) -> CodecError {
    CodecError::MissingValue {
        key: key.to_string(),
        metadata_type: metadata_type.to_string(),
    }
}

fn read_string(key: &str, metadata_type: &str, fields: &Map<String, Value>) -> CodecResult<PropertyValue> {
    match fields.get("string_value") {
        Some(Value::String(s)) => Ok(PropertyValue::String(s.clone())),
        _ => Err(missing(key, metadata_type)),
    }
}

fn read_int(key: &str, metadata_type: &str, fields: &Map<String, Value>) -> CodecResult<PropertyValue> {
    let parsed = match fields.get("int_value") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed
        .map(PropertyValue::Int)
        .ok_or_else(|| missing(key, metadata_type))
}

fn read_float(key: &str, metadata_type: &str, fields: &Map<String, Value>) -> CodecResult<PropertyValue> {
    let raw = fields.get("float_value").or_else(|| fields.get("double_value"));
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .map(PropertyValue::Float)
        .ok_or_else(|| missing(key, metadata_type))
}

fn read_bool(key: &str, metadata_type: &str, fields: &Map<String, Value>) -> CodecResult<PropertyValue> {
    match fields.get("bool_value") {
        Some(Value::Bool(b)) => Ok(PropertyValue::Bool(*b)),
        _ => Err(missing(key, metadata_type)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample() -> Properties {
        let mut plain = Properties::new();
        plain.insert("framework".to_string(), "pytorch".into());
        plain.insert("epochs".to_string(), 12i64.into());
        plain.insert("accuracy".to_string(), 0.91.into());
        plain.insert("production".to_string(), true.into());
        plain
    }

    #[test]
    fn test_typed_encoding() {
        let wire = PropertyCodec::new().encode_properties(&sample()).unwrap().unwrap();
        let json = serde_json::to_value(&wire).unwrap();

        assert_eq!(
            json["framework"],
            json!({"metadataType": "MetadataStringValue", "string_value": "pytorch"})
        );
        assert_eq!(
            json["epochs"],
            json!({"metadataType": "MetadataIntValue", "int_value": "12"})
        );
        assert_eq!(
            json["accuracy"],
            json!({"metadataType": "MetadataFloatValue", "float_value": 0.91})
        );
        assert_eq!(
            json["production"],
            json!({"metadataType": "MetadataBoolValue", "bool_value": true})
        );
    }

    #[test]
    fn test_stringify_encoding() {
        let codec = PropertyCodec::new().with_encode_mode(EncodeMode::Stringify);
        let wire = codec.encode_properties(&sample()).unwrap().unwrap();

        for envelope in wire.values() {
            assert_eq!(envelope.metadata_type(), METADATA_STRING);
        }
        assert_eq!(
            wire["production"],
            MetadataValue::String {
                string_value: "true".to_string()
            }
        );
        assert_eq!(
            wire["epochs"],
            MetadataValue::String {
                string_value: "12".to_string()
            }
        );
    }

    #[test]
    fn test_none_values_are_dropped() {
        let codec = PropertyCodec::new();
        let wire = codec
            .encode(vec![
                ("kept", Some(PropertyValue::from("yes"))),
                ("dropped", None),
            ])
            .unwrap()
            .unwrap();

        assert!(wire.contains_key("kept"));
        assert!(!wire.contains_key("dropped"));
    }

    #[test]
    fn test_empty_input_encodes_to_none() {
        let codec = PropertyCodec::new();
        assert!(codec.encode_properties(&Properties::new()).unwrap().is_none());
        assert!(codec
            .encode(vec![("only", None::<PropertyValue>)])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let err = PropertyCodec::new()
            .encode(vec![("loss", PropertyValue::Float(f64::NAN))])
            .unwrap_err();
        assert_eq!(err.key(), Some("loss"));
    }

    #[test]
    fn test_encode_json_rejects_nested_values() {
        let plain = json!({"tags": ["a", "b"]});
        let err = PropertyCodec::new()
            .encode_json(plain.as_object().unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::UnsupportedValue {
                key: "tags".to_string(),
                kind: "array"
            }
        );
    }

    #[test]
    fn test_decode_all_known_types() {
        let wire = json!({
            "a": {"metadataType": "MetadataStringValue", "string_value": "x"},
            "b": {"metadataType": "MetadataIntValue", "int_value": "42"},
            "c": {"metadataType": "MetadataIntValue", "int_value": 7},
            "d": {"metadataType": "MetadataFloatValue", "float_value": 1.5},
            "e": {"metadataType": "MetadataDoubleValue", "double_value": 2.5},
            "f": {"metadataType": "MetadataBoolValue", "bool_value": false}
        });

        let plain = PropertyCodec::strict().decode(&wire).unwrap();
        assert_eq!(plain["a"], PropertyValue::String("x".to_string()));
        assert_eq!(plain["b"], PropertyValue::Int(42));
        assert_eq!(plain["c"], PropertyValue::Int(7));
        assert_eq!(plain["d"], PropertyValue::Float(1.5));
        assert_eq!(plain["e"], PropertyValue::Float(2.5));
        assert_eq!(plain["f"], PropertyValue::Bool(false));
    }

    #[test]
    fn test_strict_decode_reports_offending_key() {
        let wire = json!({
            "good": {"metadataType": "MetadataStringValue", "string_value": "x"},
            "broken": {"metadataType": "MetadataIntValue"}
        });

        let err = PropertyCodec::strict().decode(&wire).unwrap_err();
        assert_eq!(
            err,
            CodecError::MissingValue {
                key: "broken".to_string(),
                metadata_type: METADATA_INT.to_string()
            }
        );
    }

    #[test]
    fn test_strict_decode_rejects_missing_type() {
        let wire = json!({"k": {"string_value": "x"}});
        let err = PropertyCodec::strict().decode(&wire).unwrap_err();
        assert_eq!(err, CodecError::MissingType { key: "k".to_string() });
    }

    #[test]
    fn test_lenient_decode_skips_broken_entries() {
        let wire = json!({
            "good": {"metadataType": "MetadataStringValue", "string_value": "x"},
            "broken": {"metadataType": "MetadataIntValue"},
            "untagged": {"bool_value": true}
        });

        let plain = PropertyCodec::new().decode(&wire).unwrap();
        assert_eq!(plain.len(), 2);
        assert_eq!(plain["untagged"], PropertyValue::Bool(true));
        assert!(!plain.contains_key("broken"));
    }

    #[test]
    fn test_unknown_type_fallback() {
        let wire = json!({
            "blob": {"metadataType": "MetadataProtoValue", "string_value": "raw"}
        });

        let lenient = PropertyCodec::new().decode(&wire).unwrap();
        assert_eq!(lenient["blob"], PropertyValue::String("raw".to_string()));

        let err = PropertyCodec::strict().decode(&wire).unwrap_err();
        assert!(matches!(err, CodecError::UnknownType { .. }));
    }

    #[test]
    fn test_decode_in_place_handles_items() {
        let mut body = json!({
            "items": [
                {"id": "1", "customProperties": {"a": {"metadataType": "MetadataIntValue", "int_value": "1"}}},
                {"id": "2"}
            ],
            "customProperties": {"top": {"metadataType": "MetadataBoolValue", "bool_value": true}}
        });

        PropertyCodec::strict().decode_in_place(&mut body).unwrap();
        assert_eq!(body["items"][0]["customProperties"], json!({"a": 1}));
        assert_eq!(body["customProperties"], json!({"top": true}));
        assert!(body["items"][1].get("customProperties").is_none());
    }

    #[test]
    fn test_encode_in_place_omits_empty() {
        let codec = PropertyCodec::new();

        let mut empty = json!({"name": "m", "customProperties": {}});
        codec.encode_in_place(&mut empty).unwrap();
        assert!(empty.get("customProperties").is_none());

        let mut nulls = json!({"name": "m", "customProperties": {"x": null}});
        codec.encode_in_place(&mut nulls).unwrap();
        assert!(nulls.get("customProperties").is_none());

        let mut full = json!({"name": "m", "customProperties": {"x": 3}});
        codec.encode_in_place(&mut full).unwrap();
        assert_eq!(
            full["customProperties"]["x"],
            json!({"metadataType": "MetadataIntValue", "int_value": "3"})
        );
    }

    #[test]
    fn test_encode_envelopes_matches_wire_form() {
        let envelopes = PropertyCodec::new().encode_envelopes(&sample()).unwrap();
        assert_eq!(
            envelopes["epochs"],
            json!({"metadataType": "MetadataIntValue", "int_value": "12"})
        );
        assert_eq!(
            envelopes["production"],
            json!({"metadataType": "MetadataBoolValue", "bool_value": true})
        );
        assert!(PropertyCodec::new()
            .encode_envelopes(&Properties::new())
            .unwrap()
            .is_empty());
    }

    fn property_value() -> impl Strategy<Value = PropertyValue> {
        prop_oneof![
            any::<bool>().prop_map(PropertyValue::Bool),
            any::<i64>().prop_map(PropertyValue::Int),
            (-1.0e12f64..1.0e12).prop_map(PropertyValue::Float),
            "[a-zA-Z0-9 _.-]{0,16}".prop_map(PropertyValue::String),
        ]
    }

    proptest! {
        #[test]
        fn prop_typed_round_trip(plain in prop::collection::btree_map("[a-z]{1,8}", property_value(), 0..8)) {
            let codec = PropertyCodec::strict();
            let wire = codec.encode_properties(&plain).unwrap();
            let json = serde_json::to_value(&wire).unwrap();
            let decoded = codec.decode(&json).unwrap();
            prop_assert_eq!(decoded, plain);
        }

        #[test]
        fn prop_stringify_round_trip_yields_text(plain in prop::collection::btree_map("[a-z]{1,8}", property_value(), 1..8)) {
            let codec = PropertyCodec::strict().with_encode_mode(EncodeMode::Stringify);
            let wire = codec.encode_properties(&plain).unwrap();
            let decoded = codec.decode(&serde_json::to_value(&wire).unwrap()).unwrap();
            for (key, value) in &plain {
                prop_assert_eq!(&decoded[key], &PropertyValue::String(value.to_string()));
            }
        }
    }
}
