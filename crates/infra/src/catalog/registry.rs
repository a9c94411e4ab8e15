//! Part registry: part uniqueness and placement.

use std::collections::HashMap;

use regex::Regex;
use tracing::instrument;

use stockroom_core::{CategoryId, DomainError};
use stockroom_inventory::{CategoryRecord, Location, Part, PartRecord, DEFAULT_MAX_LEN};

use super::consistency::ConsistencyChecks;
use super::directory::CategoryDirectory;
use super::error::CatalogResult;
use super::policy::{EmptySearch, TreePolicy};
use crate::store::{CatalogStore, PartSearch};

#[derive(Debug, Clone)]
pub struct PartRegistry<S> {
    store: S,
    categories: CategoryDirectory<S>,
}

impl<S: CatalogStore + Clone> PartRegistry<S> {
    pub fn new(store: S, policy: TreePolicy) -> Self {
        Self {
            categories: CategoryDirectory::new(store.clone(), policy),
            store,
        }
    }

    fn checks(&self) -> &ConsistencyChecks<S> {
        self.categories.checks()
    }

    /// Register `part` at `location`.
    ///
    /// `location` replaces whatever location the part carried.
    #[instrument(skip(self, part), fields(serial_number = %part.serial_number), err(level = "debug"))]
    pub async fn create(&self, mut part: Part, location: Location) -> CatalogResult<Part> {
        part.location = location;
        part.validate()?;

        let category = self.placement_category(&part.category).await?;
        if self.store.part_by_serial(&part.serial_number).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "serial {} already exists",
                part.serial_number
            ))
            .into());
        }
        self.ensure_location_free(&part.location, None).await?;

        self.store.insert_part(part.clone().into_record(category.id)).await?;

        tracing::info!(serial_number = %part.serial_number, category = %part.category, "part created");
        Ok(part)
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn get(&self, serial_number: &str) -> CatalogResult<Part> {
        let record = self.find(serial_number).await?;
        let category = self.category_name(record.category).await?;
        Ok(record.into_boundary(category))
    }

    /// All parts, or those matching the text query.
    ///
    /// The query is a case-sensitive regular expression tried against the
    /// serial number, name, description, location room and category name.
    #[instrument(skip(self), err(level = "debug"))]
    pub async fn list(&self, query: Option<&str>) -> CatalogResult<Vec<Part>> {
        let categories = self.store.list_categories().await?;

        let records = match query {
            None => self.store.list_parts().await?,
            Some(query) => {
                let search = search_for(query, &categories)?;
                let found = self.store.search_parts(&search).await?;
                if found.is_empty() && self.checks().policy().empty_search == EmptySearch::NotFound {
                    return Err(DomainError::not_found(format!("no parts match query {query}")).into());
                }
                found
            }
        };

        let names: HashMap<CategoryId, String> =
            categories.into_iter().map(|c| (c.id, c.name)).collect();
        Ok(records
            .into_iter()
            .map(|r| {
                let category = names.get(&r.category).cloned().unwrap_or_default();
                r.into_boundary(category)
            })
            .collect())
    }

    /// Replace the part stored under `serial_number` wholesale.
    #[instrument(skip(self, part), fields(new_serial_number = %part.serial_number), err(level = "debug"))]
    pub async fn update(
        &self,
        serial_number: &str,
        mut part: Part,
        location: Location,
    ) -> CatalogResult<Part> {
        part.location = location;
        part.validate()?;

        self.find(serial_number).await?;
        let category = self.placement_category(&part.category).await?;
        if part.serial_number != serial_number
            && self.store.part_by_serial(&part.serial_number).await?.is_some()
        {
            return Err(DomainError::conflict(format!(
                "serial {} already exists",
                part.serial_number
            ))
            .into());
        }
        self.ensure_location_free(&part.location, Some(serial_number)).await?;

        let record = part.clone().into_record(category.id);
        if !self.store.replace_part(serial_number, record).await? {
            return Err(not_found(serial_number).into());
        }

        tracing::info!(serial_number, new_serial_number = %part.serial_number, "part updated");
        Ok(part)
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, serial_number: &str) -> CatalogResult<Part> {
        let record = self
            .store
            .delete_part(serial_number)
            .await?
            .ok_or_else(|| not_found(serial_number))?;
        let category = self.category_name(record.category).await?;

        tracing::info!(serial_number, "part deleted");
        Ok(record.into_boundary(category))
    }

    async fn find(&self, serial_number: &str) -> CatalogResult<PartRecord> {
        self.store
            .part_by_serial(serial_number)
            .await?
            .ok_or_else(|| not_found(serial_number).into())
    }

    /// Resolve a category name for placing a part: it must exist and not be a root.
    async fn placement_category(&self, name: &str) -> CatalogResult<CategoryRecord> {
        let Some(category) = self.store.category_by_name(name).await? else {
            return Err(DomainError::not_found(format!("part category {name} does not exist")).into());
        };
        if !self.checks().accepts_parts(&category) {
            return Err(DomainError::invalid_argument(format!(
                "part can't be assigned to a base category ({name})"
            ))
            .into());
        }
        Ok(category)
    }

    async fn ensure_location_free(
        &self,
        location: &Location,
        excluding_serial: Option<&str>,
    ) -> CatalogResult<()> {
        if let Some(occupant) = self.checks().location_occupant(location, excluding_serial).await? {
            return Err(DomainError::conflict(format!(
                "location ({location}) is already taken by part {occupant}"
            ))
            .into());
        }
        Ok(())
    }

    async fn category_name(&self, id: CategoryId) -> CatalogResult<String> {
        match self.categories.name_of(id).await? {
            Some(name) => Ok(name),
            None => {
                tracing::warn!(category_id = %id, "part references a missing category");
                Ok(String::new())
            }
        }
    }
}

fn search_for(query: &str, categories: &[CategoryRecord]) -> CatalogResult<PartSearch> {
    if query.chars().count() > DEFAULT_MAX_LEN {
        return Err(DomainError::validation(format!(
            "query must be at most {DEFAULT_MAX_LEN} characters long"
        ))
        .into());
    }
    let pattern = Regex::new(query).map_err(|e| {
        DomainError::invalid_argument(format!("invalid search query {query}: {e}"))
    })?;
    let category_ids = categories
        .iter()
        .filter(|c| pattern.is_match(&c.name))
        .map(|c| c.id)
        .collect();
    Ok(PartSearch { pattern, category_ids })
}

fn not_found(serial_number: &str) -> DomainError {
    DomainError::not_found(format!("part with serial number {serial_number} does not exist"))
}
