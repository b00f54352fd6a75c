//! Named server-side collections (e.g. favorites).

use crate::document::Document;
use crate::error::AccessError;
use crate::model::entity::{Entity, Model};

pub const FIELD_NAME: &str = "name";
pub const FIELD_COLLECTION_TYPE: &str = "collection_type";

/// A named collection of items curated on the server.
#[derive(Clone, Debug, PartialEq)]
pub struct Collection {
    entity: Entity,
}

impl Collection {
    /// Discriminator value for collections.
    pub const TYPE: &'static str = "collection";

    /// Creates an empty collection payload.
    pub fn new() -> Self {
        Self {
            entity: Entity::new(),
        }
    }

    /// The collection's display name.
    pub fn name(&self) -> Result<Option<String>, AccessError> {
        self.entity.properties().as_string(FIELD_NAME)
    }

    /// The collection kind, e.g. `"favorites"`.
    pub fn collection_type(&self) -> Result<Option<String>, AccessError> {
        self.entity.properties().as_string(FIELD_COLLECTION_TYPE)
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for Collection {
    fn from_document(doc: Document) -> Self {
        Collection {
            entity: Entity::from_document(doc),
        }
    }

    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_fields() {
        let collection = Collection::from_json(
            r#"{"type":"collection","id":"405151","name":"Favorites","collection_type":"favorites"}"#,
        )
        .unwrap();
        assert_eq!(collection.name().unwrap().as_deref(), Some("Favorites"));
        assert_eq!(
            collection.collection_type().unwrap().as_deref(),
            Some("favorites")
        );
        assert_eq!(collection.entity().id().unwrap().as_deref(), Some("405151"));
    }
}
