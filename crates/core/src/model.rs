//! Identity of stored catalog records.

/// A record kept under a key in one of the catalog collections.
///
/// Categories are keyed by their store-assigned [`CategoryId`](crate::CategoryId),
/// parts by their serial number. Two records with the same key are the same
/// entity even when every other field differs.
pub trait Entity {
    type Id: Clone + Ord + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
