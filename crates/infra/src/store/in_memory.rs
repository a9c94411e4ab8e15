use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use stockroom_core::{CategoryId, Entity};
use stockroom_inventory::{CategoryRecord, Location, NewCategory, PartRecord};

use super::r#trait::{CatalogStore, PartSearch, StoreError};

#[derive(Debug, Default)]
struct Collections {
    // UUIDv7 keys keep categories in creation order.
    categories: BTreeMap<CategoryId, CategoryRecord>,
    parts: BTreeMap<String, PartRecord>,
}

impl Collections {
    fn name_taken(&self, name: &str, except: Option<CategoryId>) -> bool {
        self.categories
            .values()
            .any(|c| c.name == name && Some(c.id) != except)
    }

    fn occupant(&self, location: &Location, except: Option<&str>) -> Option<&PartRecord> {
        self.parts
            .values()
            .find(|p| p.location == *location && Some(p.serial_number.as_str()) != except)
    }

    fn ensure_category(&self, id: CategoryId) -> Result<(), StoreError> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Referenced(format!("category {id} does not exist")))
        }
    }

    fn holds_parts(&self, category: CategoryId) -> bool {
        self.parts.values().any(|p| p.category == category)
    }

    /// Constraint checks shared by insert and replace.
    fn check_part(&self, part: &PartRecord, replacing: Option<&str>) -> Result<(), StoreError> {
        let Some(category) = self.categories.get(&part.category) else {
            return Err(StoreError::Referenced(format!(
                "category {} does not exist",
                part.category
            )));
        };
        if category.is_root() {
            return Err(StoreError::Referenced(format!(
                "category {} is a base category and can't hold parts",
                category.name
            )));
        }
        if Some(part.serial_number.as_str()) != replacing && self.parts.contains_key(&part.serial_number) {
            return Err(StoreError::Duplicate(format!(
                "serial {} already exists",
                part.serial_number
            )));
        }
        if let Some(other) = self.occupant(&part.location, replacing) {
            return Err(StoreError::Duplicate(format!(
                "location ({}) is already taken by part {}",
                part.location, other.serial_number
            )));
        }
        Ok(())
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. Not optimized for performance: lookups other than
/// by key are linear scans. Every write checks the store-level constraints
/// under the write lock, so concurrent requests racing past the engine's
/// pre-checks still cannot break uniqueness or referential integrity.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<Collections>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord, StoreError> {
        let mut db = self.write()?;
        if db.name_taken(&category.name, None) {
            return Err(StoreError::Duplicate(format!(
                "category {} already exists",
                category.name
            )));
        }
        if let Some(parent) = category.parent {
            db.ensure_category(parent)?;
        }

        let record = category.into_record(CategoryId::new());
        db.categories.insert(*record.id(), record.clone());
        Ok(record)
    }

    async fn category_by_id(&self, id: CategoryId) -> Result<Option<CategoryRecord>, StoreError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<CategoryRecord>, StoreError> {
        Ok(self
            .read()?
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn child_categories(&self, parent: CategoryId) -> Result<Vec<CategoryRecord>, StoreError> {
        Ok(self
            .read()?
            .categories
            .values()
            .filter(|c| c.parent == Some(parent))
            .cloned()
            .collect())
    }

    async fn update_category(&self, category: CategoryRecord) -> Result<bool, StoreError> {
        let mut db = self.write()?;
        if !db.categories.contains_key(&category.id) {
            return Ok(false);
        }
        if db.name_taken(&category.name, Some(category.id)) {
            return Err(StoreError::Duplicate(format!(
                "category {} already exists",
                category.name
            )));
        }
        match category.parent {
            Some(parent) => db.ensure_category(parent)?,
            None if db.holds_parts(category.id) => {
                return Err(StoreError::Referenced(format!(
                    "category {} holds parts and can't become a base category",
                    category.name
                )));
            }
            None => {}
        }

        db.categories.insert(*category.id(), category);
        Ok(true)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, StoreError> {
        let mut db = self.write()?;
        let Some(existing) = db.categories.get(&id) else {
            return Ok(false);
        };
        if db.holds_parts(id) {
            return Err(StoreError::Referenced(format!(
                "category {} is still referenced by parts",
                existing.name
            )));
        }
        // Detached children become roots, which may not hold parts.
        if let Some(child) = db
            .categories
            .values()
            .find(|c| c.parent == Some(id) && db.holds_parts(c.id))
        {
            return Err(StoreError::Referenced(format!(
                "category {} can't be deleted: child category {} is still referenced by parts",
                existing.name, child.name
            )));
        }

        db.categories.remove(&id);
        for child in db.categories.values_mut().filter(|c| c.parent == Some(id)) {
            child.parent = None;
        }
        Ok(true)
    }

    async fn insert_part(&self, part: PartRecord) -> Result<(), StoreError> {
        let mut db = self.write()?;
        db.check_part(&part, None)?;
        db.parts.insert(part.id().clone(), part);
        Ok(())
    }

    async fn part_by_serial(&self, serial_number: &str) -> Result<Option<PartRecord>, StoreError> {
        Ok(self.read()?.parts.get(serial_number).cloned())
    }

    async fn part_at_location(
        &self,
        location: &Location,
        excluding_serial: Option<&str>,
    ) -> Result<Option<PartRecord>, StoreError> {
        Ok(self.read()?.occupant(location, excluding_serial).cloned())
    }

    async fn any_part_in(&self, category: CategoryId) -> Result<bool, StoreError> {
        Ok(self.read()?.holds_parts(category))
    }

    async fn list_parts(&self) -> Result<Vec<PartRecord>, StoreError> {
        Ok(self.read()?.parts.values().cloned().collect())
    }

    async fn search_parts(&self, search: &PartSearch) -> Result<Vec<PartRecord>, StoreError> {
        Ok(self
            .read()?
            .parts
            .values()
            .filter(|p| search.matches(p))
            .cloned()
            .collect())
    }

    async fn replace_part(&self, serial_number: &str, part: PartRecord) -> Result<bool, StoreError> {
        let mut db = self.write()?;
        if !db.parts.contains_key(serial_number) {
            return Ok(false);
        }
        db.check_part(&part, Some(serial_number))?;

        db.parts.remove(serial_number);
        db.parts.insert(part.id().clone(), part);
        Ok(true)
    }

    async fn delete_part(&self, serial_number: &str) -> Result<Option<PartRecord>, StoreError> {
        Ok(self.write()?.parts.remove(serial_number))
    }
}
