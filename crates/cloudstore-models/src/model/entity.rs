//! Base typed entity and the [`Model`] construction seam.

use crate::cache::PropertyCache;
use crate::document::{Document, Value};
use crate::error::{AccessError, DocumentError};

/// Field name of the type discriminator on server documents.
pub const FIELD_TYPE: &str = "type";

/// Field name of the object identifier on server documents.
pub const FIELD_ID: &str = "id";

/// A typed object backed by a dynamic document.
///
/// Every model owns exactly one [`Entity`] (directly or through wrapping),
/// and therefore exactly one document plus one property cache bound to it.
///
/// `from_document` is also where a concrete type intercepts fields it wants
/// eagerly interpreted: constructors may pre-convert known sub-object fields
/// through the cache (see `Folder`), while unknown fields fall back to
/// default lazy conversion. Unmodeled fields are never dropped — they ride
/// along in the document and survive the JSON round trip.
pub trait Model: 'static {
    /// Builds the model from a parsed document, taking ownership of it.
    fn from_document(doc: Document) -> Self
    where
        Self: Sized;

    /// The shared entity state.
    fn entity(&self) -> &Entity;

    /// Mutable access to the shared entity state.
    fn entity_mut(&mut self) -> &mut Entity;

    /// Builds the model from raw JSON text.
    fn from_json(text: &str) -> Result<Self, DocumentError>
    where
        Self: Sized,
    {
        Ok(Self::from_document(Document::parse(text)?))
    }

    /// The live backing document.
    ///
    /// Callers that want to retain it past this model's mutation lifecycle
    /// must clone it.
    fn document(&self) -> &Document {
        self.entity().document()
    }

    /// Serializes the backing document to JSON text.
    fn to_json(&self) -> String {
        self.document().serialize()
    }
}

/// Generic entity: one property cache over one document.
///
/// Used directly for documents with no registered variant, and as the shared
/// state inside every concrete model type. Cloning deep-copies the backing
/// document, so mutation can never leak between two logical entities.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    props: PropertyCache,
}

impl Entity {
    /// Creates an empty entity, for client-built request payloads.
    pub fn new() -> Self {
        Self::from_document(Document::new())
    }

    /// Creates a minimal reference entity containing only `id` and `type`,
    /// for use in outgoing requests.
    pub fn by_id(object_type: &str, id: &str) -> Self {
        let mut doc = Document::new();
        doc.set(FIELD_ID, Value::String(id.to_string()));
        doc.set(FIELD_TYPE, Value::String(object_type.to_string()));
        Self::from_document(doc)
    }

    /// Binds a fresh cache to the given document.
    pub fn from_document(doc: Document) -> Self {
        Self {
            props: PropertyCache::new(doc),
        }
    }

    /// The property cache (typed reads).
    pub fn properties(&self) -> &PropertyCache {
        &self.props
    }

    /// The property cache (writes).
    pub fn properties_mut(&mut self) -> &mut PropertyCache {
        &mut self.props
    }

    /// The type discriminator, if present as a string.
    ///
    /// Tolerant by design: a missing or non-string `type` field reads as
    /// `None` so that dispatch can fall back to the generic entity.
    pub fn object_type(&self) -> Option<String> {
        match self.props.get(FIELD_TYPE) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The object identifier.
    pub fn id(&self) -> Result<Option<String>, AccessError> {
        self.props.as_string(FIELD_ID)
    }

    /// Sets the object identifier.
    pub fn set_id(&mut self, id: &str) {
        self.props.set_string(FIELD_ID, id);
    }

    /// The live backing document.
    pub fn document(&self) -> &Document {
        self.props.document()
    }

    /// Consumes the entity, returning the backing document.
    pub fn into_document(self) -> Document {
        self.props.into_document()
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for Entity {
    fn from_document(doc: Document) -> Self {
        Entity::from_document(doc)
    }

    fn entity(&self) -> &Entity {
        self
    }

    fn entity_mut(&mut self) -> &mut Entity {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_entity_serializes_to_empty_object() {
        let entity = Entity::new();
        assert_eq!(entity.to_json(), "{}");
    }

    #[test]
    fn test_by_id_contains_only_id_and_type() {
        let entity = Entity::by_id("folder", "42");
        assert_eq!(entity.to_json(), r#"{"id":"42","type":"folder"}"#);
        assert_eq!(entity.object_type().as_deref(), Some("folder"));
        assert_eq!(entity.id().unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let text = r#"{"type":"folder","brand_new_field":{"deep":[1,2]},"id":"9"}"#;
        let entity = Entity::from_json(text).unwrap();
        assert_eq!(entity.to_json(), text);
    }

    #[test]
    fn test_clone_deep_copies_document() {
        let original = Entity::from_json(r#"{"id":"1"}"#).unwrap();
        let mut copy = original.clone();
        copy.set_id("2");
        assert_eq!(original.id().unwrap().as_deref(), Some("1"));
        assert_eq!(copy.id().unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_non_string_discriminator_reads_as_none() {
        let entity = Entity::from_json(r#"{"type":7}"#).unwrap();
        assert_eq!(entity.object_type(), None);
    }
}
