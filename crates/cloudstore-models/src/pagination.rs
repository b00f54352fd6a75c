//! Paginated listings of typed entries.
//!
//! A [`PaginatedCollection`] is one page of a server-side listing: the
//! `entries` array plus the paging bookkeeping that locates the page within
//! the full result set. The element type is fixed at the type level; a
//! heterogeneous listing (a folder's contents, say) uses
//! [`ModelObject`](crate::model::ModelObject) as its element.

use std::marker::PhantomData;
use std::rc::Rc;

use crate::document::Document;
use crate::error::AccessError;
use crate::model::entity::{Entity, Model};
use crate::model::order::SortOrder;

pub const FIELD_ENTRIES: &str = "entries";
pub const FIELD_OFFSET: &str = "offset";
pub const FIELD_LIMIT: &str = "limit";
pub const FIELD_TOTAL_COUNT: &str = "total_count";
pub const FIELD_ORDER: &str = "order";

/// One page of a listing, with entries converted to `T` on first access.
///
/// Paging bookkeeping (`offset`, `limit`, `total_count`) describes where the
/// page sits in the overall result set and never changes which entries this
/// page holds: two pages with identical `entries` but different `limit`
/// expose the same elements.
pub struct PaginatedCollection<T: Model> {
    entity: Entity,
    _element: PhantomData<T>,
}

impl<T: Model> PaginatedCollection<T> {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self {
            entity: Entity::new(),
            _element: PhantomData,
        }
    }

    /// Index of the first entry of this page within the full result set.
    pub fn offset(&self) -> Result<Option<i64>, AccessError> {
        self.entity.properties().as_integer(FIELD_OFFSET)
    }

    /// Page size the listing was requested with.
    pub fn limit(&self) -> Result<Option<i64>, AccessError> {
        self.entity.properties().as_integer(FIELD_LIMIT)
    }

    /// Total number of entries across all pages, when the server reports it.
    pub fn total_count(&self) -> Result<Option<i64>, AccessError> {
        self.entity.properties().as_integer(FIELD_TOTAL_COUNT)
    }

    /// Sort criteria the server applied to the listing, in priority order.
    pub fn sort_orders(&self) -> Result<Option<Rc<Vec<Rc<SortOrder>>>>, AccessError> {
        self.entity.properties().as_object_seq(FIELD_ORDER)
    }

    /// The entries of this page.
    ///
    /// An absent `entries` field reads as an empty page. The conversion is
    /// memoized; repeated calls return the same elements.
    pub fn entries(&self) -> Result<Rc<Vec<Rc<T>>>, AccessError> {
        match self.entity.properties().as_object_seq(FIELD_ENTRIES)? {
            Some(entries) => Ok(entries),
            None => Ok(Rc::new(Vec::new())),
        }
    }

    /// Number of entries on this page (not the listing-wide total).
    pub fn size(&self) -> Result<usize, AccessError> {
        Ok(self.entries()?.len())
    }

    /// The entry at `index` within this page.
    pub fn get(&self, index: usize) -> Result<Rc<T>, AccessError> {
        let entries = self.entries()?;
        match entries.get(index) {
            Some(entry) => Ok(entry.clone()),
            None => Err(AccessError::IndexOutOfRange {
                index,
                size: entries.len(),
            }),
        }
    }

    /// Iterates the entries of this page.
    ///
    /// Each call starts a fresh pass from the first entry.
    pub fn iter(&self) -> Result<Entries<T>, AccessError> {
        Ok(Entries {
            entries: self.entries()?,
            next: 0,
        })
    }
}

impl<T: Model> Default for PaginatedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Model> Model for PaginatedCollection<T> {
    fn from_document(doc: Document) -> Self {
        Self {
            entity: Entity::from_document(doc),
            _element: PhantomData,
        }
    }

    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

// Manual impls keep the element type free of `Clone`/`Debug`/`PartialEq`
// bounds; only the backing entity participates.
impl<T: Model> Clone for PaginatedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            _element: PhantomData,
        }
    }
}

impl<T: Model> std::fmt::Debug for PaginatedCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedCollection")
            .field("entity", &self.entity)
            .finish()
    }
}

impl<T: Model> PartialEq for PaginatedCollection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

/// Iterator over one page's entries.
pub struct Entries<T: Model> {
    entries: Rc<Vec<Rc<T>>>,
    next: usize,
}

impl<T: Model> Iterator for Entries<T> {
    type Item = Rc<T>;

    fn next(&mut self) -> Option<Rc<T>> {
        let entry = self.entries.get(self.next)?.clone();
        self.next += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl<T: Model> ExactSizeIterator for Entries<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::factory::ModelObject;
    use crate::model::item::File;

    fn page(text: &str) -> PaginatedCollection<ModelObject> {
        PaginatedCollection::from_json(text).unwrap()
    }

    #[test]
    fn test_bookkeeping() {
        let listing = page(
            r#"{"entries":[{"type":"file","id":"1"},{"type":"file","id":"2"},{"type":"folder","id":"3"}],
                "offset":0,"limit":100,"total_count":3}"#,
        );
        assert_eq!(listing.offset().unwrap(), Some(0));
        assert_eq!(listing.limit().unwrap(), Some(100));
        assert_eq!(listing.total_count().unwrap(), Some(3));
        assert_eq!(listing.size().unwrap(), 3);

        let first = listing.get(0).unwrap();
        assert_eq!(first.entity().id().unwrap().as_deref(), Some("1"));

        let err = listing.get(3).unwrap_err();
        assert_eq!(err, AccessError::IndexOutOfRange { index: 3, size: 3 });
    }

    #[test]
    fn test_limit_does_not_change_entries() {
        let small = page(r#"{"entries":[{"id":"1"},{"id":"2"}],"limit":2}"#);
        let large = page(r#"{"entries":[{"id":"1"},{"id":"2"}],"limit":100}"#);
        assert_eq!(small.size().unwrap(), large.size().unwrap());
        for index in 0..small.size().unwrap() {
            assert_eq!(
                small.get(index).unwrap().entity().id().unwrap(),
                large.get(index).unwrap().entity().id().unwrap()
            );
        }
    }

    #[test]
    fn test_iteration_is_restartable() {
        let listing = page(r#"{"entries":[{"id":"1"},{"id":"2"}]}"#);
        let first_pass: Vec<_> = listing.iter().unwrap().collect();
        let second_pass: Vec<_> = listing.iter().unwrap().collect();
        assert_eq!(first_pass.len(), 2);
        assert_eq!(second_pass.len(), 2);
        // Memoized conversion hands out the same elements on every pass.
        assert!(Rc::ptr_eq(&first_pass[0], &second_pass[0]));
    }

    #[test]
    fn test_absent_entries_is_an_empty_page() {
        let listing = page(r#"{"offset":0,"limit":100}"#);
        assert_eq!(listing.size().unwrap(), 0);
        assert_eq!(listing.iter().unwrap().count(), 0);
        assert!(matches!(
            listing.get(0),
            Err(AccessError::IndexOutOfRange { index: 0, size: 0 })
        ));
    }

    #[test]
    fn test_typed_element_page() {
        let listing: PaginatedCollection<File> =
            PaginatedCollection::from_json(r#"{"entries":[{"type":"file","id":"9","sha1":"f00"}]}"#)
                .unwrap();
        let file = listing.get(0).unwrap();
        assert_eq!(file.sha1().unwrap().as_deref(), Some("f00"));
    }

    #[test]
    fn test_sort_orders() {
        let listing = page(
            r#"{"entries":[],"order":[{"by":"type","direction":"ASC"},{"by":"name","direction":"DESC"}]}"#,
        );
        let orders = listing.sort_orders().unwrap().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].by().unwrap().as_deref(), Some("type"));
        assert_eq!(orders[1].direction().unwrap().as_deref(), Some("DESC"));
        assert_eq!(page(r#"{"entries":[]}"#).sort_orders().unwrap(), None);
    }

    #[test]
    fn test_exact_size_iterator() {
        let listing = page(r#"{"entries":[{"id":"1"},{"id":"2"},{"id":"3"}]}"#);
        let mut entries = listing.iter().unwrap();
        assert_eq!(entries.len(), 3);
        entries.next();
        assert_eq!(entries.len(), 2);
    }
}
