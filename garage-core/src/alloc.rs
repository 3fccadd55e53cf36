//! Identifier allocation
//!
//! The shop database has no native sequences; a new identifier is one past
//! the current maximum for its entity kind, or 1 for an empty table. The read
//! and the subsequent insert are not atomic: two allocations without an
//! intervening insert can return the same value. Callers must allocate
//! immediately before writing the row and never speculatively. `Allocator`
//! is the seam for swapping in an atomic sequence without touching workflow
//! code.

use crate::db::{ShopStore, StoreError};

/// Entity families that receive allocator-issued identifiers
///
/// Vehicles are absent: they are keyed by VIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Customer,
    Mechanic,
    Ownership,
    ServiceRequest,
    ClosedRequest,
}

/// Hands out the next identifier for an entity kind
pub trait Allocator {
    fn next(&self, kind: EntityKind) -> Result<i64, StoreError>;
}

/// Allocates one past the stored maximum identifier
pub struct MaxIdAllocator<'a> {
    store: &'a dyn ShopStore,
}

impl<'a> MaxIdAllocator<'a> {
    pub fn new(store: &'a dyn ShopStore) -> Self {
        Self { store }
    }
}

impl Allocator for MaxIdAllocator<'_> {
    fn next(&self, kind: EntityKind) -> Result<i64, StoreError> {
        Ok(self.store.max_id(kind)?.unwrap_or(0) + 1)
    }
}
