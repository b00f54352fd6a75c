//! Sort-order descriptors attached to paginated listings.

use crate::document::Document;
use crate::error::AccessError;
use crate::model::entity::{Entity, Model};

pub const FIELD_BY: &str = "by";
pub const FIELD_DIRECTION: &str = "direction";

/// One sort criterion of a listing: the field sorted by and the direction.
#[derive(Clone, Debug, PartialEq)]
pub struct SortOrder {
    entity: Entity,
}

impl SortOrder {
    /// The field the listing is sorted by, e.g. `"name"`.
    pub fn by(&self) -> Result<Option<String>, AccessError> {
        self.entity.properties().as_string(FIELD_BY)
    }

    /// The sort direction, e.g. `"ASC"` or `"DESC"`.
    pub fn direction(&self) -> Result<Option<String>, AccessError> {
        self.entity.properties().as_string(FIELD_DIRECTION)
    }
}

impl Model for SortOrder {
    fn from_document(doc: Document) -> Self {
        SortOrder {
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
    fn test_sort_order_fields() {
        let order = SortOrder::from_json(r#"{"by":"name","direction":"ASC"}"#).unwrap();
        assert_eq!(order.by().unwrap().as_deref(), Some("name"));
        assert_eq!(order.direction().unwrap().as_deref(), Some("ASC"));
    }
}
