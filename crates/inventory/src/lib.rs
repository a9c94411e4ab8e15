//! Inventory domain module: categories, parts and their physical locations.
//!
//! This crate contains the entity shapes and field rules, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Two shapes exist for
//! every entity:
//!
//! - the **boundary** shape (`Category`, `Part`) exchanged with callers, where
//!   categories are referenced by name;
//! - the **stored** shape (`CategoryRecord`, `PartRecord`) where categories are
//!   referenced by their store-assigned [`CategoryId`](stockroom_core::CategoryId).

pub mod category;
pub mod location;
pub mod part;
pub mod validate;

pub use category::{Category, CategoryRecord, NewCategory};
pub use location::Location;
pub use part::{Part, PartRecord};
pub use validate::{DEFAULT_MAX_LEN, DESCRIPTION_MAX_LEN};
