//! Cross-entity predicates shared by the category directory and the part registry.
//!
//! Every predicate reads the store at call time; nothing is cached between
//! requests, so a check always reflects the state a mutation is about to
//! change.

use std::collections::HashSet;

use tracing::instrument;

use stockroom_core::CategoryId;
use stockroom_inventory::{CategoryRecord, Location};

use super::error::CatalogResult;
use super::policy::{ChildDepth, CycleCheck, TreePolicy};
use crate::store::CatalogStore;

#[derive(Debug, Clone)]
pub struct ConsistencyChecks<S> {
    store: S,
    policy: TreePolicy,
}

impl<S: CatalogStore> ConsistencyChecks<S> {
    pub fn new(store: S, policy: TreePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> TreePolicy {
        self.policy
    }

    /// Whether any part references this category.
    pub async fn has_parts_assigned(&self, category: &CategoryRecord) -> CatalogResult<bool> {
        Ok(self.store.any_part_in(category.id).await?)
    }

    /// Whether a child category has parts assigned.
    ///
    /// Looks at direct children, or at the whole subtree under
    /// [`ChildDepth::Transitive`].
    #[instrument(skip(self, category), fields(category = %category.name))]
    pub async fn has_parts_in_children(&self, category: &CategoryRecord) -> CatalogResult<bool> {
        let mut seen = HashSet::from([category.id]);
        let mut frontier = self.store.child_categories(category.id).await?;

        while let Some(child) = frontier.pop() {
            // A stored loop must not spin forever.
            if !seen.insert(child.id) {
                continue;
            }
            if self.has_parts_assigned(&child).await? {
                tracing::debug!(child = %child.name, "child category has parts");
                return Ok(true);
            }
            if self.policy.children_depth == ChildDepth::Transitive {
                frontier.extend(self.store.child_categories(child.id).await?);
            }
        }
        Ok(false)
    }

    /// Root (base) categories never hold parts.
    pub fn accepts_parts(&self, category: &CategoryRecord) -> bool {
        category.accepts_parts()
    }

    /// Whether a part other than `excluding_serial` occupies `location`.
    pub async fn location_taken(
        &self,
        location: &Location,
        excluding_serial: Option<&str>,
    ) -> CatalogResult<bool> {
        Ok(self.location_occupant(location, excluding_serial).await?.is_some())
    }

    /// Serial number of the part occupying `location`, if any.
    pub async fn location_occupant(
        &self,
        location: &Location,
        excluding_serial: Option<&str>,
    ) -> CatalogResult<Option<String>> {
        Ok(self
            .store
            .part_at_location(location, excluding_serial)
            .await?
            .map(|p| p.serial_number))
    }

    /// Whether giving `category` the parent `parent` closes a loop.
    ///
    /// Under [`CycleCheck::SelfOnly`] only the direct self-reference counts.
    pub async fn closes_cycle(
        &self,
        category: CategoryId,
        parent: &CategoryRecord,
    ) -> CatalogResult<bool> {
        if parent.id == category {
            return Ok(true);
        }
        if self.policy.cycles == CycleCheck::SelfOnly {
            return Ok(false);
        }

        let mut seen = HashSet::from([parent.id]);
        let mut next = parent.parent;
        while let Some(id) = next {
            if id == category {
                return Ok(true);
            }
            if !seen.insert(id) {
                break;
            }
            next = self.store.category_by_id(id).await?.and_then(|c| c.parent);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::fixtures::{leaf, location, part_record, root};
    use crate::store::InMemoryCatalogStore;

    fn checks(store: &Arc<InMemoryCatalogStore>, policy: TreePolicy) -> ConsistencyChecks<Arc<InMemoryCatalogStore>> {
        ConsistencyChecks::new(store.clone(), policy)
    }

    #[tokio::test]
    async fn parts_assigned_and_in_children() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let c1 = root(&store, "c1").await;
        let c2 = leaf(&store, "c2", &c1).await;
        let checks = checks(&store, TreePolicy::default());

        assert!(!checks.has_parts_assigned(&c2).await.unwrap());
        assert!(!checks.has_parts_in_children(&c1).await.unwrap());

        store.insert_part(part_record("P", c2.id, 1)).await.unwrap();

        assert!(checks.has_parts_assigned(&c2).await.unwrap());
        assert!(!checks.has_parts_assigned(&c1).await.unwrap());
        assert!(checks.has_parts_in_children(&c1).await.unwrap());
        assert!(!checks.has_parts_in_children(&c2).await.unwrap());
    }

    #[tokio::test]
    async fn grandchildren_only_count_when_transitive() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let top = root(&store, "top").await;
        let mid = leaf(&store, "mid", &top).await;
        let bottom = leaf(&store, "bottom", &mid).await;
        store.insert_part(part_record("P", bottom.id, 1)).await.unwrap();

        let direct = checks(&store, TreePolicy::default());
        assert!(!direct.has_parts_in_children(&top).await.unwrap());

        let transitive = checks(
            &store,
            TreePolicy { children_depth: ChildDepth::Transitive, ..TreePolicy::default() },
        );
        assert!(transitive.has_parts_in_children(&top).await.unwrap());
    }

    #[tokio::test]
    async fn accepts_parts_only_below_roots() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let base = root(&store, "base_parts").await;
        let test = leaf(&store, "test_parts", &base).await;
        let checks = checks(&store, TreePolicy::default());

        assert!(!checks.accepts_parts(&base));
        assert!(checks.accepts_parts(&test));
    }

    #[tokio::test]
    async fn location_taken_ignores_the_excluded_part() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let base = root(&store, "base").await;
        let shelf = leaf(&store, "shelf", &base).await;
        store.insert_part(part_record("A", shelf.id, 1)).await.unwrap();
        let checks = checks(&store, TreePolicy::default());

        assert!(checks.location_taken(&location(1), None).await.unwrap());
        assert!(!checks.location_taken(&location(1), Some("A")).await.unwrap());
        assert!(!checks.location_taken(&location(2), None).await.unwrap());
        assert_eq!(
            checks.location_occupant(&location(1), Some("B")).await.unwrap(),
            Some("A".to_string())
        );
    }

    #[tokio::test]
    async fn cycle_detection_follows_policy() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let a = root(&store, "a").await;
        let b = leaf(&store, "b", &a).await;
        let c = leaf(&store, "c", &b).await;

        let self_only = checks(&store, TreePolicy::default());
        assert!(self_only.closes_cycle(a.id, &a).await.unwrap());
        assert!(!self_only.closes_cycle(a.id, &c).await.unwrap());

        let ancestry = checks(
            &store,
            TreePolicy { cycles: CycleCheck::Ancestry, ..TreePolicy::default() },
        );
        assert!(ancestry.closes_cycle(a.id, &c).await.unwrap());
        assert!(!ancestry.closes_cycle(c.id, &a).await.unwrap());
    }
}
