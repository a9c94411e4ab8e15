//! Store-assigned identifiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a stored category.
///
/// Never exposed on the wire; boundary shapes refer to categories by name.
/// UUIDv7 values sort by creation time, which gives stores a stable listing
/// order for free.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(Uuid);

impl CategoryId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<CategoryId> for Uuid {
    fn from(value: CategoryId) -> Self {
        value.0
    }
}
