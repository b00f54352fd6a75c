//! Dynamic, order-preserving JSON documents.
//!
//! A [`Document`] is the single source of truth for every entity: an ordered
//! mapping from string keys to JSON values, parsed from and serialized back
//! to JSON text. Key order is preserved (serde_json's `preserve_order`
//! feature) so a parsed document re-serializes with its fields in the
//! original order.
//!
//! Reads hand out defensive copies: mutating a value returned by
//! [`Document::get`] never affects the document. All typed views (the
//! property cache, entities, collections) are derived from the document and
//! never mutated independently of it.

use serde_json::Map;

pub use serde_json::Value;

use crate::error::{AccessError, DocumentError};

/// Returns a short name for the JSON shape of a value, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An ordered key→value mapping equivalent to a parsed JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    map: Map<String, Value>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self { map: Map::new() }
    }

    /// Parses JSON text into a document.
    ///
    /// The top-level value must be an object; anything else (including valid
    /// JSON arrays or scalars) is rejected.
    pub fn parse(text: &str) -> Result<Document, DocumentError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Converts an already-parsed JSON value into a document.
    pub fn from_value(value: Value) -> Result<Document, DocumentError> {
        match value {
            Value::Object(map) => Ok(Document { map }),
            other => Err(DocumentError::NotAnObject {
                found: value_kind(&other),
            }),
        }
    }

    /// Wraps a raw object map without re-validating it.
    pub(crate) fn from_map(map: Map<String, Value>) -> Document {
        Document { map }
    }

    /// Gets the value for a key, as a defensive copy.
    ///
    /// An explicit JSON `null` is returned as `Some(Value::Null)`; only a
    /// missing key yields `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key).cloned()
    }

    /// Replaces or inserts a value.
    ///
    /// Pre-existing keys keep their position; new keys are appended at the
    /// end.
    pub fn set(&mut self, key: &str, value: Value) {
        self.map.insert(key.to_string(), value);
    }

    /// Appends a value to an array-shaped field.
    ///
    /// If the field is absent (or explicit `null`), an empty array is
    /// created first. A present non-array field is a [`TypeMismatch`]
    /// contract violation.
    ///
    /// [`TypeMismatch`]: AccessError::TypeMismatch
    pub fn append_to_array(&mut self, key: &str, value: Value) -> Result<(), AccessError> {
        match self.map.get_mut(key) {
            None => {
                self.map.insert(key.to_string(), Value::Array(vec![value]));
                Ok(())
            }
            Some(slot @ Value::Null) => {
                *slot = Value::Array(vec![value]);
                Ok(())
            }
            Some(Value::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(other) => Err(AccessError::TypeMismatch {
                field: key.to_string(),
                expected: "array",
                found: value_kind(other),
            }),
        }
    }

    /// Removes a key, preserving the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.map.shift_remove(key)
    }

    /// Returns true if the document contains the key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Iterates the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Serializes the document to JSON text.
    ///
    /// Deterministic given the same key order and values, and the exact
    /// inverse of [`Document::parse`] for documents produced through this
    /// type.
    pub fn serialize(&self) -> String {
        // Serializing an in-memory JSON value cannot fail: keys are strings
        // and there is no I/O involved.
        serde_json::to_string(&self.map).unwrap()
    }

    /// Returns the document as a JSON value (deep copy).
    pub fn to_value(&self) -> Value {
        Value::Object(self.map.clone())
    }

    /// Consumes the document, returning its JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.map)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_rejects_invalid_syntax() {
        assert!(matches!(
            Document::parse("{not json"),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(
            Document::parse("[1,2,3]"),
            Err(DocumentError::NotAnObject { found: "array" })
        ));
        assert!(matches!(
            Document::parse("42"),
            Err(DocumentError::NotAnObject { found: "number" })
        ));
    }

    #[test]
    fn test_roundtrip_preserves_key_order() {
        let text = r#"{"zebra":1,"apple":2,"mango":{"b":1,"a":2}}"#;
        let doc = Document::parse(text).unwrap();
        assert_eq!(doc.serialize(), text);
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_set_keeps_position_of_existing_keys() {
        let mut doc = Document::parse(r#"{"a":1,"b":2}"#).unwrap();
        doc.set("a", json!(3));
        doc.set("c", json!(4));
        assert_eq!(doc.serialize(), r#"{"a":3,"b":2,"c":4}"#);
    }

    #[test]
    fn test_get_is_a_defensive_copy() {
        let mut doc = Document::parse(r#"{"nested":{"x":1}}"#).unwrap();
        let mut copy = doc.get("nested").unwrap();
        if let Value::Object(map) = &mut copy {
            map.insert("x".to_string(), json!(999));
        }
        assert_eq!(doc.get("nested"), Some(json!({"x": 1})));

        // Null is present, missing is absent.
        doc.set("gone", Value::Null);
        assert_eq!(doc.get("gone"), Some(Value::Null));
        assert_eq!(doc.get("never"), None);
    }

    #[test]
    fn test_append_to_array() {
        let mut doc = Document::parse(r#"{"tags":["a"]}"#).unwrap();
        doc.append_to_array("tags", json!("b")).unwrap();
        assert_eq!(doc.get("tags"), Some(json!(["a", "b"])));
    }

    #[test]
    fn test_append_auto_creates_absent_array() {
        let mut doc = Document::new();
        doc.append_to_array("tags", json!("a")).unwrap();
        assert_eq!(doc.get("tags"), Some(json!(["a"])));

        let mut doc = Document::parse(r#"{"tags":null}"#).unwrap();
        doc.append_to_array("tags", json!("a")).unwrap();
        assert_eq!(doc.get("tags"), Some(json!(["a"])));
    }

    #[test]
    fn test_append_to_non_array_fails() {
        let mut doc = Document::parse(r#"{"tags":"scalar"}"#).unwrap();
        let err = doc.append_to_array("tags", json!("a")).unwrap_err();
        assert_eq!(
            err,
            AccessError::TypeMismatch {
                field: "tags".to_string(),
                expected: "array",
                found: "string",
            }
        );
        // The document is untouched by the failed append.
        assert_eq!(doc.get("tags"), Some(json!("scalar")));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut doc = Document::parse(r#"{"a":1,"b":2,"c":3}"#).unwrap();
        assert_eq!(doc.remove("b"), Some(json!(2)));
        assert_eq!(doc.serialize(), r#"{"a":1,"c":3}"#);
        assert_eq!(doc.remove("b"), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = Document::parse(r#"{"a":1}"#).unwrap();
        let copy = original.clone();
        original.set("a", json!(2));
        original.set("b", json!(3));
        assert_eq!(copy.serialize(), r#"{"a":1}"#);
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            any::<f64>().prop_map(Value::from),
            "[a-zA-Z0-9 _-]{0,12}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(("[a-z]{1,8}", inner), 0..6).prop_map(|pairs| {
                    let mut map = Map::new();
                    for (key, value) in pairs {
                        map.insert(key, value);
                    }
                    Value::Object(map)
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_serialize_parse_roundtrip(
            pairs in prop::collection::vec(("[a-z_]{1,10}", arb_json()), 0..8)
        ) {
            let mut doc = Document::new();
            for (key, value) in pairs {
                doc.set(&key, value);
            }
            let text = doc.serialize();
            let reparsed = Document::parse(&text).unwrap();
            // Structural equality plus byte-identical re-serialization
            // (catches key-order drift that map equality would miss).
            prop_assert_eq!(&reparsed, &doc);
            prop_assert_eq!(reparsed.serialize(), text);
        }
    }
}
