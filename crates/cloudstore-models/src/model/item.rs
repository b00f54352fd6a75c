//! Folder and file models, plus the field catalog they share.

use std::rc::Rc;

use crate::document::Document;
use crate::error::AccessError;
use crate::model::entity::{Entity, Model};
use crate::model::factory::ModelObject;
use crate::pagination::PaginatedCollection;
use crate::util::timestamp::Timestamp;

pub const FIELD_NAME: &str = "name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_ETAG: &str = "etag";
pub const FIELD_SEQUENCE_ID: &str = "sequence_id";
pub const FIELD_SIZE: &str = "size";
pub const FIELD_CREATED_AT: &str = "created_at";
pub const FIELD_MODIFIED_AT: &str = "modified_at";
pub const FIELD_CONTENT_CREATED_AT: &str = "content_created_at";
pub const FIELD_CONTENT_MODIFIED_AT: &str = "content_modified_at";
pub const FIELD_ITEM_STATUS: &str = "item_status";

pub const FIELD_HAS_COLLABORATIONS: &str = "has_collaborations";
pub const FIELD_SYNC_STATE: &str = "sync_state";
pub const FIELD_CAN_NON_OWNERS_INVITE: &str = "can_non_owners_invite";
pub const FIELD_ITEM_COLLECTION: &str = "item_collection";
pub const FIELD_IS_EXTERNALLY_OWNED: &str = "is_externally_owned";

pub const FIELD_SHA1: &str = "sha1";
pub const FIELD_VERSION_NUMBER: &str = "version_number";
pub const FIELD_COMMENT_COUNT: &str = "comment_count";

/// Accessors shared by every listable item (folders and files).
///
/// Shared fields live in one catalog instead of an inheritance chain; a
/// concrete item type opts in with an empty `impl` block.
pub trait Item: Model {
    /// The item's display name.
    fn name(&self) -> Result<Option<String>, AccessError> {
        self.entity().properties().as_string(FIELD_NAME)
    }

    /// The item's description.
    fn description(&self) -> Result<Option<String>, AccessError> {
        self.entity().properties().as_string(FIELD_DESCRIPTION)
    }

    /// Entity tag for conditional requests.
    fn etag(&self) -> Result<Option<String>, AccessError> {
        self.entity().properties().as_string(FIELD_ETAG)
    }

    fn sequence_id(&self) -> Result<Option<String>, AccessError> {
        self.entity().properties().as_string(FIELD_SEQUENCE_ID)
    }

    /// Item size in bytes.
    fn size(&self) -> Result<Option<i64>, AccessError> {
        self.entity().properties().as_integer(FIELD_SIZE)
    }

    /// When the item was created on the server.
    fn created_at(&self) -> Result<Option<Timestamp>, AccessError> {
        self.entity().properties().as_timestamp(FIELD_CREATED_AT)
    }

    /// When the item was last modified on the server.
    fn modified_at(&self) -> Result<Option<Timestamp>, AccessError> {
        self.entity().properties().as_timestamp(FIELD_MODIFIED_AT)
    }

    /// When the item's content was created (as opposed to uploaded).
    fn content_created_at(&self) -> Result<Option<Timestamp>, AccessError> {
        self.entity()
            .properties()
            .as_timestamp(FIELD_CONTENT_CREATED_AT)
    }

    /// When the item's content was last modified.
    fn content_modified_at(&self) -> Result<Option<Timestamp>, AccessError> {
        self.entity()
            .properties()
            .as_timestamp(FIELD_CONTENT_MODIFIED_AT)
    }

    /// Whether the item is active, trashed, or deleted.
    fn item_status(&self) -> Result<Option<String>, AccessError> {
        self.entity().properties().as_string(FIELD_ITEM_STATUS)
    }

    /// Sets the name, for rename request bodies.
    fn set_name(&mut self, name: &str) {
        self.entity_mut().properties_mut().set_string(FIELD_NAME, name);
    }

    /// Sets the description, for update request bodies.
    fn set_description(&mut self, description: &str) {
        self.entity_mut()
            .properties_mut()
            .set_string(FIELD_DESCRIPTION, description);
    }
}

/// Sync states a folder can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    Synced,
    NotSynced,
    PartiallySynced,
}

impl SyncState {
    /// Parses the wire string; unknown strings yield `None`.
    pub fn parse(value: &str) -> Option<SyncState> {
        match value {
            "synced" => Some(SyncState::Synced),
            "not_synced" => Some(SyncState::NotSynced),
            "partially_synced" => Some(SyncState::PartiallySynced),
            _ => None,
        }
    }

    /// The wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Synced => "synced",
            SyncState::NotSynced => "not_synced",
            SyncState::PartiallySynced => "partially_synced",
        }
    }
}

/// A folder on the server.
#[derive(Clone, Debug, PartialEq)]
pub struct Folder {
    entity: Entity,
}

impl Folder {
    /// Discriminator value for folders.
    pub const TYPE: &'static str = "folder";

    /// Creates an empty folder payload.
    pub fn new() -> Self {
        Self {
            entity: Entity::new(),
        }
    }

    /// Creates a minimal folder reference carrying only `id` and `type`.
    pub fn by_id(id: &str) -> Self {
        Self {
            entity: Entity::by_id(Self::TYPE, id),
        }
    }

    /// Whether the folder has any collaborations.
    pub fn has_collaborations(&self) -> Result<Option<bool>, AccessError> {
        self.entity
            .properties()
            .as_boolean(FIELD_HAS_COLLABORATIONS)
    }

    /// Whether non-owners can invite collaborators.
    pub fn can_non_owners_invite(&self) -> Result<Option<bool>, AccessError> {
        self.entity
            .properties()
            .as_boolean(FIELD_CAN_NON_OWNERS_INVITE)
    }

    /// Whether the folder is owned outside the enterprise.
    pub fn is_externally_owned(&self) -> Result<Option<bool>, AccessError> {
        self.entity
            .properties()
            .as_boolean(FIELD_IS_EXTERNALLY_OWNED)
    }

    /// The folder's sync state.
    ///
    /// An unrecognized state string degrades to `None` (logged), so a new
    /// server-side state never breaks parsing.
    pub fn sync_state(&self) -> Result<Option<SyncState>, AccessError> {
        let raw = self.entity.properties().as_string(FIELD_SYNC_STATE)?;
        Ok(raw.and_then(|value| {
            let state = SyncState::parse(&value);
            if state.is_none() {
                log::warn!("ignoring unknown sync_state {:?}", value);
            }
            state
        }))
    }

    /// The paginated listing of items contained in this folder.
    pub fn item_collection(
        &self,
    ) -> Result<Option<Rc<PaginatedCollection<ModelObject>>>, AccessError> {
        self.entity.properties().as_object(FIELD_ITEM_COLLECTION)
    }
}

impl Default for Folder {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for Folder {
    fn from_document(doc: Document) -> Self {
        let folder = Folder {
            entity: Entity::from_document(doc),
        };
        // Interpret the nested listing eagerly so its variant dispatch
        // happens at parse time. A malformed field is left for the lazy
        // accessor to report.
        if let Err(err) = folder.item_collection() {
            log::warn!("deferring malformed item_collection: {}", err);
        }
        folder
    }

    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

impl Item for Folder {}

/// A file on the server.
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    entity: Entity,
}

impl File {
    /// Discriminator value for files.
    pub const TYPE: &'static str = "file";

    /// Creates an empty file payload.
    pub fn new() -> Self {
        Self {
            entity: Entity::new(),
        }
    }

    /// Creates a minimal file reference carrying only `id` and `type`.
    pub fn by_id(id: &str) -> Self {
        Self {
            entity: Entity::by_id(Self::TYPE, id),
        }
    }

    /// SHA-1 hash of the file content.
    pub fn sha1(&self) -> Result<Option<String>, AccessError> {
        self.entity.properties().as_string(FIELD_SHA1)
    }

    /// The file's version number.
    pub fn version_number(&self) -> Result<Option<String>, AccessError> {
        self.entity.properties().as_string(FIELD_VERSION_NUMBER)
    }

    /// Number of comments on the file.
    pub fn comment_count(&self) -> Result<Option<i64>, AccessError> {
        self.entity.properties().as_integer(FIELD_COMMENT_COUNT)
    }
}

impl Default for File {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for File {
    fn from_document(doc: Document) -> Self {
        File {
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

impl Item for File {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_by_id_payload() {
        let folder = Folder::by_id("42");
        assert_eq!(folder.to_json(), r#"{"id":"42","type":"folder"}"#);
        let file = File::by_id("7");
        assert_eq!(file.to_json(), r#"{"id":"7","type":"file"}"#);
    }

    #[test]
    fn test_item_accessors() {
        let file = File::from_json(
            r#"{"type":"file","id":"7","name":"report.pdf","size":2048,
                "created_at":"2013-05-10T18:50:41-07:00","sha1":"abc123",
                "item_status":"active"}"#,
        )
        .unwrap();
        assert_eq!(file.name().unwrap().as_deref(), Some("report.pdf"));
        assert_eq!(file.size().unwrap(), Some(2048));
        assert_eq!(file.sha1().unwrap().as_deref(), Some("abc123"));
        assert_eq!(file.item_status().unwrap().as_deref(), Some("active"));
        assert_eq!(
            file.created_at().unwrap().unwrap().offset_minutes(),
            -420
        );
    }

    #[test]
    fn test_set_name_for_request_body() {
        let mut folder = Folder::by_id("42");
        folder.set_name("Renamed");
        assert_eq!(
            folder.to_json(),
            r#"{"id":"42","type":"folder","name":"Renamed"}"#
        );
    }

    #[test]
    fn test_sync_state_parsing() {
        let folder =
            Folder::from_json(r#"{"type":"folder","sync_state":"partially_synced"}"#).unwrap();
        assert_eq!(
            folder.sync_state().unwrap(),
            Some(SyncState::PartiallySynced)
        );

        // Unknown states degrade to None instead of failing.
        let folder =
            Folder::from_json(r#"{"type":"folder","sync_state":"brand_new_state"}"#).unwrap();
        assert_eq!(folder.sync_state().unwrap(), None);
    }

    #[test]
    fn test_folder_scenario() {
        let text = r#"{"type":"folder","id":"42","name":"Docs","item_collection":{"entries":[{"type":"file","id":"7"}],"offset":0,"limit":100,"total_count":1}}"#;
        let folder = Folder::from_json(text).unwrap();
        assert_eq!(folder.entity().object_type().as_deref(), Some("folder"));
        assert_eq!(folder.entity().id().unwrap().as_deref(), Some("42"));

        let items = folder.item_collection().unwrap().expect("listing present");
        assert_eq!(items.size().unwrap(), 1);
        let element = items.get(0).unwrap();
        let file = element.as_file().expect("file variant");
        assert_eq!(file.entity().id().unwrap().as_deref(), Some("7"));

        // Re-serializing and reparsing yields an equal structure.
        let reparsed = Document::parse(&folder.to_json()).unwrap();
        assert_eq!(reparsed, Document::parse(text).unwrap());
    }

    #[test]
    fn test_eager_listing_shares_identity_with_lazy_reads() {
        let folder = Folder::from_json(
            r#"{"type":"folder","item_collection":{"entries":[],"offset":0}}"#,
        )
        .unwrap();
        let first = folder.item_collection().unwrap().unwrap();
        let second = folder.item_collection().unwrap().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }
}
