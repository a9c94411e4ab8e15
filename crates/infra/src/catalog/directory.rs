//! Category directory: owns the structural rules of the category forest.
//!
//! Callers speak in names; the store speaks in identifiers. This is the only
//! place (together with the part registry) where one is translated into the
//! other, in both directions.

use std::collections::HashMap;

use tracing::instrument;

use stockroom_core::{CategoryId, DomainError};
use stockroom_inventory::{Category, CategoryRecord, NewCategory};

use super::consistency::ConsistencyChecks;
use super::error::CatalogResult;
use super::policy::TreePolicy;
use crate::store::CatalogStore;

#[derive(Debug, Clone)]
pub struct CategoryDirectory<S> {
    store: S,
    checks: ConsistencyChecks<S>,
}

impl<S: CatalogStore + Clone> CategoryDirectory<S> {
    pub fn new(store: S, policy: TreePolicy) -> Self {
        Self {
            checks: ConsistencyChecks::new(store.clone(), policy),
            store,
        }
    }

    pub fn checks(&self) -> &ConsistencyChecks<S> {
        &self.checks
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn create(&self, category: Category) -> CatalogResult<Category> {
        category.validate()?;
        category.ensure_not_self_parented()?;
        self.ensure_name_free(&category.name).await?;

        let parent = self.resolve_parent(&category.parent_name).await?;
        self.store
            .insert_category(NewCategory {
                name: category.name.clone(),
                parent: parent.map(|p| p.id),
            })
            .await?;

        tracing::info!(name = %category.name, parent = %category.parent_name, "category created");
        Ok(category)
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn get(&self, name: &str) -> CatalogResult<Category> {
        let record = self.find(name).await?;
        self.to_boundary(record).await
    }

    pub async fn list(&self) -> CatalogResult<Vec<Category>> {
        let records = self.store.list_categories().await?;
        let names: HashMap<CategoryId, String> =
            records.iter().map(|c| (c.id, c.name.clone())).collect();

        Ok(records
            .into_iter()
            .map(|c| {
                let parent_name = c.parent.and_then(|id| names.get(&id).cloned());
                c.into_boundary(parent_name)
            })
            .collect())
    }

    /// Rename and/or reparent `name`.
    ///
    /// Reparenting is unrestricted because parts and children point at the
    /// category's identifier, which never changes. Turning the category into a
    /// root is the exception: roots cannot hold parts.
    #[instrument(skip(self), err(level = "debug"))]
    pub async fn update(&self, name: &str, update: Category) -> CatalogResult<Category> {
        let current = self.find(name).await?;

        update.validate()?;
        update.ensure_not_self_parented()?;
        if update.name != current.name {
            self.ensure_name_free(&update.name).await?;
        }

        let parent = match self.resolve_parent(&update.parent_name).await? {
            Some(parent) => {
                if self.checks.closes_cycle(current.id, &parent).await? {
                    return Err(DomainError::invalid_argument(format!(
                        "category {} can't be moved under {}: it would become its own ancestor",
                        current.name, parent.name
                    ))
                    .into());
                }
                Some(parent.id)
            }
            None => {
                if self.checks.has_parts_assigned(&current).await? {
                    return Err(DomainError::invalid_argument(format!(
                        "category {} has parts assigned and can't become a base category",
                        current.name
                    ))
                    .into());
                }
                None
            }
        };

        let record = CategoryRecord {
            id: current.id,
            name: update.name.clone(),
            parent,
        };
        if !self.store.update_category(record).await? {
            return Err(not_found(name).into());
        }

        tracing::info!(from = %name, to = %update.name, parent = %update.parent_name, "category updated");
        Ok(update)
    }

    /// Delete `name` unless it or one of its children still holds parts.
    #[instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, name: &str) -> CatalogResult<Category> {
        let current = self.find(name).await?;

        if self.checks.has_parts_assigned(&current).await? {
            return Err(DomainError::invalid_argument(format!(
                "can't delete category {name}: it has parts assigned"
            ))
            .into());
        }
        if self.checks.has_parts_in_children(&current).await? {
            return Err(DomainError::invalid_argument(format!(
                "can't delete category {name}: child categories have parts assigned"
            ))
            .into());
        }

        let id = current.id;
        let deleted = self.to_boundary(current).await?;
        if !self.store.delete_category(id).await? {
            return Err(not_found(name).into());
        }

        tracing::info!(name, "category deleted");
        Ok(deleted)
    }

    /// Stored record for `name`, or `NotFound`.
    pub async fn find(&self, name: &str) -> CatalogResult<CategoryRecord> {
        self.store
            .category_by_name(name)
            .await?
            .ok_or_else(|| not_found(name).into())
    }

    /// Name of the category with identifier `id`.
    ///
    /// Returns `None` when the identifier no longer resolves.
    pub async fn name_of(&self, id: CategoryId) -> CatalogResult<Option<String>> {
        Ok(self.store.category_by_id(id).await?.map(|c| c.name))
    }

    async fn resolve_parent(&self, parent_name: &str) -> CatalogResult<Option<CategoryRecord>> {
        if parent_name.is_empty() {
            return Ok(None);
        }
        match self.store.category_by_name(parent_name).await? {
            Some(parent) => Ok(Some(parent)),
            None => Err(DomainError::not_found(format!(
                "parent category with name {parent_name} does not exist"
            ))
            .into()),
        }
    }

    async fn ensure_name_free(&self, name: &str) -> CatalogResult<()> {
        if self.store.category_by_name(name).await?.is_some() {
            return Err(DomainError::conflict(format!("category {name} already exists")).into());
        }
        Ok(())
    }

    async fn to_boundary(&self, record: CategoryRecord) -> CatalogResult<Category> {
        let parent_name = match record.parent {
            Some(id) => self.name_of(id).await?,
            None => None,
        };
        Ok(record.into_boundary(parent_name))
    }
}

fn not_found(name: &str) -> DomainError {
    DomainError::not_found(format!("category with name {name} does not exist"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::CatalogError;
    use crate::catalog::fixtures::part_record;
    use crate::catalog::policy::CycleCheck;
    use crate::store::InMemoryCatalogStore;

    fn directory() -> (Arc<InMemoryCatalogStore>, CategoryDirectory<Arc<InMemoryCatalogStore>>) {
        let store = Arc::new(InMemoryCatalogStore::new());
        (store.clone(), CategoryDirectory::new(store, TreePolicy::default()))
    }

    fn expect_domain(err: CatalogError) -> DomainError {
        match err {
            CatalogError::Domain(e) => e,
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_root_then_get() {
        let (_, dir) = directory();
        dir.create(Category::root("abc")).await.unwrap();
        assert_eq!(dir.get("abc").await.unwrap(), Category::root("abc"));
    }

    #[tokio::test]
    async fn create_child_resolves_parent_name() {
        let (store, dir) = directory();
        dir.create(Category::root("123")).await.unwrap();
        let created = dir.create(Category::child("456", "123")).await.unwrap();
        assert_eq!(created, Category::child("456", "123"));

        let parent = store.category_by_name("123").await.unwrap().unwrap();
        let child = store.category_by_name("456").await.unwrap().unwrap();
        assert_eq!(child.parent, Some(parent.id));
        assert_eq!(dir.get("456").await.unwrap(), Category::child("456", "123"));
    }

    #[tokio::test]
    async fn create_duplicate_is_conflict() {
        let (_, dir) = directory();
        dir.create(Category::root("def")).await.unwrap();
        let err = expect_domain(dir.create(Category::root("def")).await.unwrap_err());
        assert_eq!(err, DomainError::conflict("category def already exists"));
    }

    #[tokio::test]
    async fn self_parent_is_invalid_even_when_name_exists() {
        let (_, dir) = directory();
        let err = expect_domain(dir.create(Category::child("resistors", "resistors")).await.unwrap_err());
        assert!(matches!(err, DomainError::InvalidArgument(_)));

        dir.create(Category::root("resistors")).await.unwrap();
        let err = expect_domain(dir.create(Category::child("resistors", "resistors")).await.unwrap_err());
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn missing_parent_is_not_found() {
        let (_, dir) = directory();
        let err = expect_domain(dir.create(Category::child("xyz", "qwop")).await.unwrap_err());
        assert_eq!(err, DomainError::not_found("parent category with name qwop does not exist"));
    }

    #[tokio::test]
    async fn malformed_names_fail_validation_before_store_access() {
        let (store, dir) = directory();
        let err = expect_domain(dir.create(Category::root("")).await.unwrap_err());
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(store.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let (_, dir) = directory();
        let err = expect_domain(dir.get("doesntexist").await.unwrap_err());
        assert_eq!(err, DomainError::not_found("category with name doesntexist does not exist"));
    }

    #[tokio::test]
    async fn list_resolves_parent_names() {
        let (_, dir) = directory();
        dir.create(Category::root("base")).await.unwrap();
        dir.create(Category::child("leaf", "base")).await.unwrap();

        let all = dir.list().await.unwrap();
        assert_eq!(all, vec![Category::root("base"), Category::child("leaf", "base")]);
        for c in all {
            dir.get(&c.name).await.unwrap();
        }
    }

    #[tokio::test]
    async fn rename_keeps_children_attached() {
        let (_, dir) = directory();
        dir.create(Category::root("edit_me")).await.unwrap();
        dir.create(Category::child("child", "edit_me")).await.unwrap();

        let updated = dir.update("edit_me", Category::root("new_name")).await.unwrap();
        assert_eq!(updated, Category::root("new_name"));
        assert_eq!(dir.get("child").await.unwrap(), Category::child("child", "new_name"));
        assert!(dir.get("edit_me").await.is_err());
    }

    #[tokio::test]
    async fn update_checks_new_values() {
        let (_, dir) = directory();
        dir.create(Category::root("a")).await.unwrap();
        dir.create(Category::root("b")).await.unwrap();

        let err = expect_domain(dir.update("missing", Category::root("x")).await.unwrap_err());
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = expect_domain(dir.update("a", Category::root("b")).await.unwrap_err());
        assert_eq!(err, DomainError::conflict("category b already exists"));

        let err = expect_domain(dir.update("a", Category::child("c", "c")).await.unwrap_err());
        assert!(matches!(err, DomainError::InvalidArgument(_)));

        // Parent given by the old name is still the category itself.
        let err = expect_domain(dir.update("a", Category::child("c", "a")).await.unwrap_err());
        assert!(matches!(err, DomainError::InvalidArgument(_)));

        let err = expect_domain(dir.update("a", Category::child("a", "nope")).await.unwrap_err());
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn becoming_root_requires_no_parts() {
        let (store, dir) = directory();
        dir.create(Category::root("base")).await.unwrap();
        dir.create(Category::child("leaf", "base")).await.unwrap();
        let leaf = store.category_by_name("leaf").await.unwrap().unwrap();
        store.insert_part(part_record("P", leaf.id, 1)).await.unwrap();

        let err = expect_domain(dir.update("leaf", Category::root("leaf")).await.unwrap_err());
        assert!(matches!(err, DomainError::InvalidArgument(msg) if msg.contains("has parts assigned")));

        // Moving under another parent is fine.
        dir.create(Category::root("other")).await.unwrap();
        let moved = dir.update("leaf", Category::child("leaf", "other")).await.unwrap();
        assert_eq!(moved, Category::child("leaf", "other"));
    }

    #[tokio::test]
    async fn ancestry_policy_rejects_longer_cycles() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let policy = TreePolicy { cycles: CycleCheck::Ancestry, ..TreePolicy::default() };
        let dir = CategoryDirectory::new(store, policy);
        dir.create(Category::root("A")).await.unwrap();
        dir.create(Category::child("B", "A")).await.unwrap();

        let err = expect_domain(dir.update("A", Category::child("A", "B")).await.unwrap_err());
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn self_only_policy_allows_longer_cycles() {
        let (_, dir) = directory();
        dir.create(Category::root("A")).await.unwrap();
        dir.create(Category::child("B", "A")).await.unwrap();

        let updated = dir.update("A", Category::child("A", "B")).await.unwrap();
        assert_eq!(updated, Category::child("A", "B"));
    }

    #[tokio::test]
    async fn delete_guards_and_order() {
        let (store, dir) = directory();
        dir.create(Category::root("c1")).await.unwrap();
        dir.create(Category::child("c2", "c1")).await.unwrap();
        let c2 = store.category_by_name("c2").await.unwrap().unwrap();
        store.insert_part(part_record("P", c2.id, 1)).await.unwrap();

        let err = expect_domain(dir.delete("c1").await.unwrap_err());
        assert!(matches!(&err, DomainError::InvalidArgument(m) if m.contains("child categories have parts assigned")));

        let err = expect_domain(dir.delete("c2").await.unwrap_err());
        assert!(matches!(&err, DomainError::InvalidArgument(m) if m.contains("has parts assigned")));

        store.delete_part("P").await.unwrap();
        assert_eq!(dir.delete("c2").await.unwrap(), Category::child("c2", "c1"));
        assert_eq!(dir.delete("c1").await.unwrap(), Category::root("c1"));
        assert!(dir.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_child_check_cannot_leave_a_part_in_a_base_category() {
        let (store, dir) = directory();
        dir.create(Category::root("c1")).await.unwrap();
        dir.create(Category::child("c2", "c1")).await.unwrap();
        let c1 = dir.find("c1").await.unwrap();
        let c2 = dir.find("c2").await.unwrap();

        // The delete guard passes, then a part lands before the write.
        assert!(!dir.checks().has_parts_in_children(&c1).await.unwrap());
        store.insert_part(part_record("P", c2.id, 1)).await.unwrap();

        let err: CatalogError = store.delete_category(c1.id).await.unwrap_err().into();
        assert!(matches!(expect_domain(err), DomainError::Conflict(_)));
        assert_eq!(dir.get("c2").await.unwrap(), Category::child("c2", "c1"));
        assert_eq!(dir.get("c1").await.unwrap(), Category::root("c1"));
    }

    #[tokio::test]
    async fn deleting_a_parent_promotes_empty_children() {
        let (_, dir) = directory();
        dir.create(Category::root("top")).await.unwrap();
        dir.create(Category::child("sub", "top")).await.unwrap();

        dir.delete("top").await.unwrap();
        assert_eq!(dir.get("sub").await.unwrap(), Category::root("sub"));

        let err = expect_domain(dir.delete("top").await.unwrap_err());
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
