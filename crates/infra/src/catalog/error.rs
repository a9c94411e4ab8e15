use thiserror::Error;

use stockroom_core::DomainError;

use crate::store::StoreError;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error returned by every catalog operation.
///
/// Store constraint violations are folded into [`DomainError::Conflict`], so a
/// duplicate caught by the store (a lost race) and a duplicate caught by the
/// engine's own pre-check look the same to callers.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) | StoreError::Referenced(msg) => {
                CatalogError::Domain(DomainError::conflict(msg))
            }
            other => CatalogError::Store(other),
        }
    }
}

impl CatalogError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            CatalogError::Domain(e) => Some(e),
            CatalogError::Store(_) => None,
        }
    }
}
