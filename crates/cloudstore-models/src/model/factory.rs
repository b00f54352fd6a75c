//! Variant dispatch: discriminator registry and the [`ModelObject`] union.
//!
//! Server documents declare their concrete variant through a `type` field.
//! The registry maps discriminator strings to plain constructor functions,
//! is seeded with the built-in variants, and lives in process-wide
//! read-mostly state initialized once on first use. Host applications may
//! [`register`] additional variants or override built-ins.

use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use crate::document::Document;
use crate::model::collection::Collection;
use crate::model::entity::{Entity, Model};
use crate::model::item::{File, Folder};

/// Constructor for one registered variant.
pub type Constructor = fn(Document) -> ModelObject;

lazy_static! {
    static ref REGISTRY: RwLock<FxHashMap<String, Constructor>> =
        RwLock::new(builtin_constructors());
}

fn builtin_constructors() -> FxHashMap<String, Constructor> {
    let mut map: FxHashMap<String, Constructor> = FxHashMap::default();
    map.insert(Folder::TYPE.to_string(), |doc| {
        ModelObject::Folder(Folder::from_document(doc))
    });
    map.insert(File::TYPE.to_string(), |doc| {
        ModelObject::File(File::from_document(doc))
    });
    map.insert(Collection::TYPE.to_string(), |doc| {
        ModelObject::Collection(Collection::from_document(doc))
    });
    map
}

/// Registers a constructor for a discriminator.
///
/// Idempotent; the last registration wins, which lets host applications
/// override built-in variants.
pub fn register(discriminator: &str, constructor: Constructor) {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    registry.insert(discriminator.to_string(), constructor);
}

/// Builds the correctly-typed model object for a document.
///
/// Reads the `type` discriminator and invokes the registered constructor.
/// A missing, non-string, or unregistered discriminator falls back to
/// [`ModelObject::Unknown`], which still exposes raw-field access and
/// round-trips the document losslessly — an unknown type is never an error.
///
/// The registry is only read here and the lock is released before the
/// constructor runs, so construction is reentrant: a constructor may itself
/// create nested objects.
pub fn create(doc: Document) -> ModelObject {
    let constructor = doc
        .get(crate::model::entity::FIELD_TYPE)
        .and_then(|value| value.as_str().map(str::to_owned))
        .and_then(|discriminator| {
            REGISTRY
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&discriminator)
                .copied()
        });
    match constructor {
        Some(constructor) => constructor(doc),
        None => ModelObject::Unknown(Entity::from_document(doc)),
    }
}

/// A model object of any variant, selected by discriminator at construction.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelObject {
    Folder(Folder),
    File(File),
    Collection(Collection),
    /// Fallback for unregistered discriminators; keeps every field intact.
    Unknown(Entity),
}

impl ModelObject {
    /// The discriminator string, if the document carries one.
    pub fn object_type(&self) -> Option<String> {
        self.entity().object_type()
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            ModelObject::Folder(folder) => Some(folder),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            ModelObject::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            ModelObject::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_unknown(&self) -> Option<&Entity> {
        match self {
            ModelObject::Unknown(entity) => Some(entity),
            _ => None,
        }
    }
}

impl Model for ModelObject {
    fn from_document(doc: Document) -> Self {
        create(doc)
    }

    fn entity(&self) -> &Entity {
        match self {
            ModelObject::Folder(folder) => folder.entity(),
            ModelObject::File(file) => file.entity(),
            ModelObject::Collection(collection) => collection.entity(),
            ModelObject::Unknown(entity) => entity,
        }
    }

    fn entity_mut(&mut self) -> &mut Entity {
        match self {
            ModelObject::Folder(folder) => folder.entity_mut(),
            ModelObject::File(file) => file.entity_mut(),
            ModelObject::Collection(collection) => collection.entity_mut(),
            ModelObject::Unknown(entity) => entity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_discriminator() {
        let folder = ModelObject::from_json(r#"{"type":"folder","id":"1"}"#).unwrap();
        assert!(folder.as_folder().is_some());

        let file = ModelObject::from_json(r#"{"type":"file","id":"2"}"#).unwrap();
        assert!(file.as_file().is_some());

        let collection = ModelObject::from_json(r#"{"type":"collection","id":"3"}"#).unwrap();
        assert!(collection.as_collection().is_some());
    }

    #[test]
    fn test_unknown_discriminator_falls_back() {
        let object = ModelObject::from_json(r#"{"type":"unknown_x","id":"4"}"#).unwrap();
        let entity = object.as_unknown().expect("generic fallback");
        assert_eq!(entity.object_type().as_deref(), Some("unknown_x"));
        // Unknown types round-trip losslessly.
        assert_eq!(object.to_json(), r#"{"type":"unknown_x","id":"4"}"#);
    }

    #[test]
    fn test_missing_discriminator_falls_back() {
        let object = ModelObject::from_json(r#"{"id":"5"}"#).unwrap();
        assert!(object.as_unknown().is_some());
        assert_eq!(object.object_type(), None);
    }

    #[test]
    fn test_registered_constructor_wins() {
        fn as_file(doc: Document) -> ModelObject {
            ModelObject::File(File::from_document(doc))
        }
        register("custom_doc", as_file);
        let object = ModelObject::from_json(r#"{"type":"custom_doc"}"#).unwrap();
        assert!(object.as_file().is_some());

        // Last registration wins.
        fn as_generic(doc: Document) -> ModelObject {
            ModelObject::Unknown(Entity::from_document(doc))
        }
        register("custom_doc", as_generic);
        let object = ModelObject::from_json(r#"{"type":"custom_doc"}"#).unwrap();
        assert!(object.as_unknown().is_some());
    }
}
