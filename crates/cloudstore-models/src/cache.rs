//! Lazy typed-property cache over a dynamic document.
//!
//! A [`PropertyCache`] owns one [`Document`] and memoizes the expensive
//! conversions made from it: timestamps, string sequences, nested typed
//! objects, and typed-object sequences. Scalar conversions are cheap and read
//! straight off the document.
//!
//! # Cache coherency
//!
//! Every write removes (never updates) the memo entry for the written field
//! before touching the document, so a read after a write always re-derives
//! from the raw value. This is the single most safety-critical invariant of
//! the subsystem: a reader-after-writer must never observe a pre-write
//! cached value.
//!
//! # Conversion failure policy
//!
//! A field that is physically absent (missing key or explicit `null`)
//! converts to `Ok(None)`. A field that is present but structurally
//! incompatible with the requested type is an
//! [`AccessError::TypeMismatch`] — a contract violation, not a recoverable
//! condition. Content-quality problems (a timestamp string that fails the
//! RFC 3339 grammar) are absorbed as `Ok(None)` and logged, since server
//! documents routinely contain fields the client does not fully understand.
//!
//! # Concurrency
//!
//! Reads take `&self` through interior mutability (`RefCell`), and the memo
//! holds `Rc` entries, so the type is deliberately not `Sync`: one cache
//! instance belongs to one thread at a time. Distinct caches (including
//! clones) share no state and may be used freely on different threads.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::document::{value_kind, Document, Value};
use crate::error::AccessError;
use crate::model::Model;
use crate::util::timestamp::Timestamp;

/// Memoizing typed-conversion layer bound to one document.
pub struct PropertyCache {
    doc: Document,
    memo: RefCell<FxHashMap<String, Rc<dyn Any>>>,
}

impl PropertyCache {
    /// Binds a new, cold cache to a document.
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            memo: RefCell::new(FxHashMap::default()),
        }
    }

    /// The live backing document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Consumes the cache, returning the backing document.
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Raw field read, as a defensive copy.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.doc.get(field)
    }

    /// Keys of the backing document, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.doc.keys()
    }

    /// Returns true if the field exists (even as explicit `null`).
    pub fn contains(&self, field: &str) -> bool {
        self.doc.contains_key(field)
    }

    // =========================================================================
    // Typed reads
    // =========================================================================

    /// Reads a string field.
    pub fn as_string(&self, field: &str) -> Result<Option<String>, AccessError> {
        match self.doc.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(mismatch(field, "string", &other)),
        }
    }

    /// Reads a boolean field.
    pub fn as_boolean(&self, field: &str) -> Result<Option<bool>, AccessError> {
        match self.doc.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(mismatch(field, "boolean", &other)),
        }
    }

    /// Reads an integer field.
    ///
    /// Accepts any JSON number; fractional values truncate toward zero.
    pub fn as_integer(&self, field: &str) -> Result<Option<i64>, AccessError> {
        match self.doc.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(v) => Ok(Some(v)),
                None => Ok(n.as_f64().map(|f| f as i64)),
            },
            Some(other) => Err(mismatch(field, "number", &other)),
        }
    }

    /// Reads a floating-point field.
    pub fn as_float(&self, field: &str) -> Result<Option<f64>, AccessError> {
        match self.doc.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(other) => Err(mismatch(field, "number", &other)),
        }
    }

    /// Reads an RFC 3339 timestamp field, memoizing the parsed value.
    ///
    /// A string that fails the timestamp grammar converts to `Ok(None)` and
    /// is logged; only successful parses are cached, so a later overwrite of
    /// the field with a valid timestamp is picked up normally.
    pub fn as_timestamp(&self, field: &str) -> Result<Option<Timestamp>, AccessError> {
        if let Some(hit) = self.memo_get::<Timestamp>(field) {
            return Ok(Some(*hit));
        }
        let raw = match self.doc.get(field) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s,
            Some(other) => return Err(mismatch(field, "string", &other)),
        };
        match Timestamp::parse(&raw) {
            Ok(ts) => {
                self.memo_put(field, Rc::new(ts));
                Ok(Some(ts))
            }
            Err(err) => {
                log::warn!("ignoring unparsable timestamp in field {:?}: {}", field, err);
                Ok(None)
            }
        }
    }

    /// Reads a string-sequence field, memoizing the converted list.
    ///
    /// The returned `Rc` is identity-stable across repeated reads until the
    /// field is written.
    pub fn as_string_seq(&self, field: &str) -> Result<Option<Rc<Vec<String>>>, AccessError> {
        if let Some(hit) = self.memo_get::<Vec<String>>(field) {
            return Ok(Some(hit));
        }
        let items = match self.doc.get(field) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(mismatch(field, "array", &other)),
        };
        let mut strings = Vec::with_capacity(items.len());
        for item in &items {
            match item {
                Value::String(s) => strings.push(s.clone()),
                other => return Err(mismatch(field, "array of strings", other)),
            }
        }
        let strings = Rc::new(strings);
        self.memo_put(field, strings.clone());
        Ok(Some(strings))
    }

    /// Reads an object field as a typed sub-entity, memoizing the result.
    ///
    /// The sub-entity is built once via `T::from_document` and the same `Rc`
    /// is returned on every read until the field is written.
    pub fn as_object<T: Model>(&self, field: &str) -> Result<Option<Rc<T>>, AccessError> {
        if let Some(hit) = self.memo_get::<T>(field) {
            return Ok(Some(hit));
        }
        let map = match self.doc.get(field) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(map)) => map,
            Some(other) => return Err(mismatch(field, "object", &other)),
        };
        let object = Rc::new(T::from_document(Document::from_map(map)));
        self.memo_put(field, object.clone());
        Ok(Some(object))
    }

    /// Reads an array-of-objects field as typed sub-entities.
    ///
    /// Converted once per field; element identity is stable across repeated
    /// reads of the same field until invalidated.
    pub fn as_object_seq<T: Model>(
        &self,
        field: &str,
    ) -> Result<Option<Rc<Vec<Rc<T>>>>, AccessError> {
        if let Some(hit) = self.memo_get::<Vec<Rc<T>>>(field) {
            return Ok(Some(hit));
        }
        let items = match self.doc.get(field) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(mismatch(field, "array", &other)),
        };
        let mut objects = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(map) => {
                    objects.push(Rc::new(T::from_document(Document::from_map(map))));
                }
                other => return Err(mismatch(field, "array of objects", &other)),
            }
        }
        let objects = Rc::new(objects);
        self.memo_put(field, objects.clone());
        Ok(Some(objects))
    }

    // =========================================================================
    // Writes (all invalidate before touching the document)
    // =========================================================================

    /// Sets a raw JSON value.
    pub fn set_value(&mut self, field: &str, value: Value) {
        self.invalidate(field);
        self.doc.set(field, value);
    }

    /// Sets a string field.
    pub fn set_string(&mut self, field: &str, value: &str) {
        self.set_value(field, Value::String(value.to_string()));
    }

    /// Sets a boolean field.
    pub fn set_boolean(&mut self, field: &str, value: bool) {
        self.set_value(field, Value::Bool(value));
    }

    /// Sets an integer field.
    pub fn set_integer(&mut self, field: &str, value: i64) {
        self.set_value(field, Value::from(value));
    }

    /// Sets a floating-point field. Non-finite values store as `null`.
    pub fn set_float(&mut self, field: &str, value: f64) {
        self.set_value(field, Value::from(value));
    }

    /// Sets a timestamp field, stored as its RFC 3339 string.
    pub fn set_timestamp(&mut self, field: &str, value: Timestamp) {
        self.set_value(field, Value::String(value.format()));
    }

    /// Sets an explicit `null`.
    pub fn set_null(&mut self, field: &str) {
        self.set_value(field, Value::Null);
    }

    /// Stores an independent copy of a typed sub-entity.
    ///
    /// The entity's document is deep-copied, so later mutation of `object`
    /// cannot leak into this document (and vice versa).
    pub fn set_object<T: Model>(&mut self, field: &str, object: &T) {
        self.set_value(field, object.document().to_value());
    }

    /// Appends a raw value to an array field (auto-created when absent).
    pub fn append_to_array(&mut self, field: &str, value: Value) -> Result<(), AccessError> {
        self.invalidate(field);
        self.doc.append_to_array(field, value)
    }

    /// Appends an independent copy of a typed sub-entity to an array field.
    pub fn append_object<T: Model>(&mut self, field: &str, object: &T) -> Result<(), AccessError> {
        self.append_to_array(field, object.document().to_value())
    }

    /// Removes a field (and its memo entry).
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.invalidate(field);
        self.doc.remove(field)
    }

    fn invalidate(&mut self, field: &str) {
        self.memo.get_mut().remove(field);
    }

    fn memo_get<T: 'static>(&self, field: &str) -> Option<Rc<T>> {
        let memo = self.memo.borrow();
        let entry = memo.get(field)?;
        // A field re-read under a different target type is treated as a miss
        // and reconverted.
        entry.clone().downcast::<T>().ok()
    }

    fn memo_put(&self, field: &str, entry: Rc<dyn Any>) {
        self.memo.borrow_mut().insert(field.to_string(), entry);
    }
}

impl PartialEq for PropertyCache {
    /// Structural equality of the backing documents; memo state is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.doc == other.doc
    }
}

impl Clone for PropertyCache {
    /// Deep-copies the backing document; the clone starts with a cold cache.
    fn clone(&self) -> Self {
        Self::new(self.doc.clone())
    }
}

impl std::fmt::Debug for PropertyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyCache")
            .field("document", &self.doc)
            .field("memoized", &self.memo.borrow().len())
            .finish()
    }
}

fn mismatch(field: &str, expected: &'static str, value: &Value) -> AccessError {
    AccessError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: value_kind(value),
    }
}
