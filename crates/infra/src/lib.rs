//! Infrastructure layer: catalog store adapters, the consistency engine and
//! configuration.

pub mod catalog;
pub mod config;
pub mod store;
