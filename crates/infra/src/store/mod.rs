//! Store adapter: the query/command boundary over the "categories" and
//! "parts" collections.
//!
//! The trait makes no storage assumptions; the engine receives an
//! implementation at construction time, so tests run against
//! [`InMemoryCatalogStore`] and deployments against Postgres.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryCatalogStore;
#[cfg(feature = "postgres")]
pub use postgres::{PostgresCatalogStore, PostgresOptions};
pub use r#trait::{CatalogStore, PartSearch, StoreError};
