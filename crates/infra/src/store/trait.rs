use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use stockroom_core::CategoryId;
use stockroom_inventory::{CategoryRecord, Location, NewCategory, PartRecord};

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. The two
/// constraint variants exist so that a race the engine's pre-checks could not
/// see (two concurrent creates of the same serial, say) still surfaces as a
/// conflict instead of a generic failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (category name, part serial,
    /// part location).
    #[error("{0}")]
    Duplicate(String),

    /// A referential constraint rejected the write (missing category, or a
    /// category still referenced by parts).
    #[error("{0}")]
    Referenced(String),

    /// Anything else: connection loss, poisoned lock, malformed row.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Text search over the parts collection.
///
/// A part matches when `pattern` matches its serial number, name, description
/// or location room, or when its category is one of `category_ids` (the
/// caller resolves category-name matches up front).
#[derive(Debug, Clone)]
pub struct PartSearch {
    pub pattern: Regex,
    pub category_ids: Vec<CategoryId>,
}

impl PartSearch {
    pub fn matches(&self, part: &PartRecord) -> bool {
        self.pattern.is_match(&part.serial_number)
            || self.pattern.is_match(&part.name)
            || self.pattern.is_match(&part.description)
            || self.pattern.is_match(&part.location.room)
            || self.category_ids.contains(&part.category)
    }
}

/// Query/command interface over the "categories" and "parts" collections.
///
/// The store is a black-box substrate: it knows nothing about tree rules or
/// placement rules, which live in [`crate::catalog`]. It does however own the
/// constraints a document store can enforce natively, and implementations
/// must:
/// - reject a second category with the same name (`Duplicate`)
/// - reject a second part with the same serial number or the same location
///   (`Duplicate`)
/// - reject parts referencing a missing category, and deletion of a category
///   still referenced by parts (`Referenced`)
/// - never let a root category hold parts: refuse part writes into a root,
///   re-rooting a category that holds parts, and deleting a category whose
///   direct children hold parts (`Referenced`)
/// - detach (make root) the direct children of a deleted category as part of
///   the same write
///
/// Listing methods return records in a stable order (categories by creation,
/// parts by serial number).
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a category, assigning its identifier.
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord, StoreError>;

    async fn category_by_id(&self, id: CategoryId) -> Result<Option<CategoryRecord>, StoreError>;

    async fn category_by_name(&self, name: &str) -> Result<Option<CategoryRecord>, StoreError>;

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, StoreError>;

    /// Categories whose parent reference equals `parent`.
    async fn child_categories(&self, parent: CategoryId) -> Result<Vec<CategoryRecord>, StoreError>;

    /// Replace the category with the same identifier. Returns `false` if it no
    /// longer exists.
    async fn update_category(&self, category: CategoryRecord) -> Result<bool, StoreError>;

    /// Remove a category and detach its direct children. Refused while any of
    /// those children holds parts. Returns `false` if it did not exist.
    async fn delete_category(&self, id: CategoryId) -> Result<bool, StoreError>;

    async fn insert_part(&self, part: PartRecord) -> Result<(), StoreError>;

    async fn part_by_serial(&self, serial_number: &str) -> Result<Option<PartRecord>, StoreError>;

    /// The part occupying `location`, ignoring the part identified by
    /// `excluding_serial`.
    async fn part_at_location(
        &self,
        location: &Location,
        excluding_serial: Option<&str>,
    ) -> Result<Option<PartRecord>, StoreError>;

    /// Whether any part references `category`.
    async fn any_part_in(&self, category: CategoryId) -> Result<bool, StoreError>;

    async fn list_parts(&self) -> Result<Vec<PartRecord>, StoreError>;

    async fn search_parts(&self, search: &PartSearch) -> Result<Vec<PartRecord>, StoreError>;

    /// Replace the part stored under `serial_number` (the replacement may carry
    /// a new serial). Returns `false` if no such part exists.
    async fn replace_part(&self, serial_number: &str, part: PartRecord) -> Result<bool, StoreError>;

    /// Remove a part, returning it if it existed.
    async fn delete_part(&self, serial_number: &str) -> Result<Option<PartRecord>, StoreError>;
}

#[async_trait::async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord, StoreError> {
        (**self).insert_category(category).await
    }

    async fn category_by_id(&self, id: CategoryId) -> Result<Option<CategoryRecord>, StoreError> {
        (**self).category_by_id(id).await
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<CategoryRecord>, StoreError> {
        (**self).category_by_name(name).await
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        (**self).list_categories().await
    }

    async fn child_categories(&self, parent: CategoryId) -> Result<Vec<CategoryRecord>, StoreError> {
        (**self).child_categories(parent).await
    }

    async fn update_category(&self, category: CategoryRecord) -> Result<bool, StoreError> {
        (**self).update_category(category).await
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, StoreError> {
        (**self).delete_category(id).await
    }

    async fn insert_part(&self, part: PartRecord) -> Result<(), StoreError> {
        (**self).insert_part(part).await
    }

    async fn part_by_serial(&self, serial_number: &str) -> Result<Option<PartRecord>, StoreError> {
        (**self).part_by_serial(serial_number).await
    }

    async fn part_at_location(
        &self,
        location: &Location,
        excluding_serial: Option<&str>,
    ) -> Result<Option<PartRecord>, StoreError> {
        (**self).part_at_location(location, excluding_serial).await
    }

    async fn any_part_in(&self, category: CategoryId) -> Result<bool, StoreError> {
        (**self).any_part_in(category).await
    }

    async fn list_parts(&self) -> Result<Vec<PartRecord>, StoreError> {
        (**self).list_parts().await
    }

    async fn search_parts(&self, search: &PartSearch) -> Result<Vec<PartRecord>, StoreError> {
        (**self).search_parts(search).await
    }

    async fn replace_part(&self, serial_number: &str, part: PartRecord) -> Result<bool, StoreError> {
        (**self).replace_part(serial_number, part).await
    }

    async fn delete_part(&self, serial_number: &str) -> Result<Option<PartRecord>, StoreError> {
        (**self).delete_part(serial_number).await
    }
}
