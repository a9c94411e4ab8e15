//! Consistency engine over a [`CatalogStore`](crate::store::CatalogStore).
//!
//! [`CategoryDirectory`] owns the category tree rules, [`PartRegistry`] owns
//! part uniqueness and placement, and both lean on [`ConsistencyChecks`] for
//! the predicates that span the two collections.

pub mod consistency;
pub mod directory;
pub mod error;
pub mod policy;
pub mod registry;

pub use consistency::ConsistencyChecks;
pub use directory::CategoryDirectory;
pub use error::{CatalogError, CatalogResult};
pub use policy::{ChildDepth, CycleCheck, EmptySearch, ParsePolicyError, TreePolicy};
pub use registry::PartRegistry;

use crate::store::CatalogStore;

/// Both halves of the engine over one shared store.
#[derive(Debug, Clone)]
pub struct Catalog<S> {
    pub categories: CategoryDirectory<S>,
    pub parts: PartRegistry<S>,
}

impl<S: CatalogStore + Clone> Catalog<S> {
    pub fn new(store: S, policy: TreePolicy) -> Self {
        Self {
            categories: CategoryDirectory::new(store.clone(), policy),
            parts: PartRegistry::new(store, policy),
        }
    }

    pub fn policy(&self) -> TreePolicy {
        self.categories.checks().policy()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use stockroom_core::CategoryId;
    use stockroom_inventory::{CategoryRecord, Location, NewCategory, Part, PartRecord};

    use crate::store::{CatalogStore, InMemoryCatalogStore};

    pub async fn root(store: &Arc<InMemoryCatalogStore>, name: &str) -> CategoryRecord {
        store
            .insert_category(NewCategory { name: name.to_string(), parent: None })
            .await
            .unwrap()
    }

    pub async fn leaf(
        store: &Arc<InMemoryCatalogStore>,
        name: &str,
        parent: &CategoryRecord,
    ) -> CategoryRecord {
        store
            .insert_category(NewCategory { name: name.to_string(), parent: Some(parent.id) })
            .await
            .unwrap()
    }

    /// A slot in "basement1" that differs from its neighbours by row only.
    pub fn location(row: i64) -> Location {
        Location {
            room: "basement1".to_string(),
            bookcase: 1,
            shelf: 1,
            cuvette: 1,
            column: 1,
            row,
        }
    }

    pub fn part(serial: &str, category: &str, row: i64) -> Part {
        Part {
            serial_number: serial.to_string(),
            name: "resistor".to_string(),
            description: "10k through-hole".to_string(),
            category: category.to_string(),
            quantity: 100,
            price: 0.5,
            location: location(row),
        }
    }

    pub fn part_record(serial: &str, category: CategoryId, row: i64) -> PartRecord {
        part(serial, "", row).into_record(category)
    }
}
