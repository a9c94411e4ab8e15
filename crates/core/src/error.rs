//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (shape
/// validation, tree and placement rules, uniqueness). Storage failures belong
/// to the infrastructure layer.
///
/// Every variant carries a human-readable message naming the offending value;
/// the message is what callers ultimately see.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field failed shape validation (length, range, missing value).
    #[error("{0}")]
    Validation(String),

    /// The request is well-formed but semantically invalid (self-parenting,
    /// assigning a part to a base category, editing a category with dependents).
    #[error("{0}")]
    InvalidArgument(String),

    /// A referenced category or part does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A unique key is already taken (category name, part serial, part location).
    #[error("{0}")]
    Conflict(String),
}

/// Coarse classification of a [`DomainError`], used by transports to pick a status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    InvalidArgument,
    NotFound,
    Conflict,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) => ErrorKind::Validation,
            DomainError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Conflict(_) => ErrorKind::Conflict,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DomainError::Validation(m)
            | DomainError::InvalidArgument(m)
            | DomainError::NotFound(m)
            | DomainError::Conflict(m) => m,
        }
    }
}
