//! The resource ledger: persisted mapping of resource name to owned
//! quantity.
//!
//! Quantities are non-negative by type and by contract: a debit larger
//! than the balance is rejected outright, so no sequence of public
//! operations can drive an entry below zero.

use crate::error::{GameError, GameResult};
use relink_store::backend::StorageBackend;
use relink_store::store::{PersistentStore, StoreEvent};

/// Non-negative amount of a named resource.
pub type Quantity = u32;

/// Case-sensitive resource identifier.
pub type ResourceName = String;

/// Persisted resource holdings for a manufactory.
#[derive(Debug)]
pub struct ResourceLedger {
    store: PersistentStore<ResourceName, Quantity>,
}

impl ResourceLedger {
    /// Restore the ledger from the backend (empty and eagerly persisted on
    /// first open; self-healing on corrupt text).
    pub fn open(backend: &mut dyn StorageBackend, storage_key: &str) -> GameResult<Self> {
        let store = PersistentStore::open(backend, storage_key)?;
        Ok(Self { store })
    }

    /// Owned amount of a resource; absent entries read as zero.
    pub fn amount(&self, resource: &str) -> Quantity {
        self.store
            .get(&resource.to_string())
            .copied()
            .unwrap_or(0)
    }

    /// Add to a resource balance, capping at the type limit.
    pub fn credit(
        &mut self,
        backend: &mut dyn StorageBackend,
        resource: &str,
        qty: Quantity,
    ) -> GameResult<()> {
        let next = self.amount(resource).saturating_add(qty);
        self.store.set(backend, resource.to_string(), next)?;
        Ok(())
    }

    /// Remove from a resource balance. A shortfall is rejected and leaves
    /// the ledger untouched.
    pub fn debit(
        &mut self,
        backend: &mut dyn StorageBackend,
        resource: &str,
        qty: Quantity,
    ) -> GameResult<()> {
        let available = self.amount(resource);
        if available < qty {
            return Err(GameError::InsufficientResource {
                resource: resource.to_string(),
                required: qty,
                available,
            });
        }
        self.store
            .set(backend, resource.to_string(), available - qty)?;
        Ok(())
    }

    /// Whether the ledger holds at least `qty` of `resource`.
    pub fn holds(&self, resource: &str, qty: Quantity) -> bool {
        self.amount(resource) >= qty
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&ResourceName, &Quantity)> {
        self.store.entries()
    }

    /// Drain accumulated change events.
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        self.store.drain_events()
    }
}
