//! Port abstraction for catalogue persistence.
//!
//! Besides plain reads and writes, adapters expose [`ItemRepository::with_lock`]:
//! an exclusive, row-scoped critical section in which a pure mutation inspects
//! the locked row and returns a [`WritePlan`]. The adapter applies the plan in
//! the same unit of work, so either every write in the plan lands or none do.

use async_trait::async_trait;

use crate::domain::{
    CatalogItem, ItemChanges, ItemCounts, ItemId, ItemKind, ListScope, NewItem, Owner,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by item repository adapters.
    pub enum ItemRepositoryError {
        /// The store could not be reached.
        Connection { message: String } => "item repository connection failed: {message}",
        /// A query or mutation failed.
        Query { message: String } => "item repository query failed: {message}",
        /// Lock contention or a serialization failure; safe to retry.
        Contention { message: String } => "item repository contention: {message}",
        /// The write broke an integrity rule of the current row state.
        Conflict { message: String } => "item repository conflict: {message}",
    }
}

/// Row condition checked after the lock is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockPredicate {
    /// Required holder, if any.
    pub owner: Option<Owner>,
    /// Require at least one unit of stock.
    pub in_stock: bool,
}

impl LockPredicate {
    /// Rows held by the store.
    pub fn store_held() -> Self {
        Self {
            owner: Some(Owner::Store),
            in_stock: false,
        }
    }

    /// Store rows with stock left.
    pub fn store_held_in_stock() -> Self {
        Self {
            owner: Some(Owner::Store),
            in_stock: true,
        }
    }

    /// True when the locked row satisfies the predicate.
    pub fn admits(&self, item: &CatalogItem) -> bool {
        let owner_ok = self.owner.is_none_or(|owner| owner == item.owner());
        let stock_ok = !self.in_stock || item.stock().get() > 0;
        owner_ok && stock_ok
    }
}

/// Writes to apply to a locked row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WritePlan {
    /// New holder of the locked row.
    pub reassign_to: Option<Owner>,
    /// Units to remove from the locked row; the write is rejected if fewer
    /// remain.
    pub take_units: u32,
    /// Row to insert alongside.
    pub insert: Option<NewItem>,
}

impl WritePlan {
    /// Move the locked row to `owner`.
    pub fn reassign(owner: Owner) -> Self {
        Self {
            reassign_to: Some(owner),
            ..Self::default()
        }
    }

    /// Take one unit from the locked row and insert `row`.
    pub fn split_unit(row: NewItem) -> Self {
        Self {
            take_units: 1,
            insert: Some(row),
            ..Self::default()
        }
    }
}

/// Mutation evaluated under the row lock; `None` declines the write.
pub type LockedMutation = Box<dyn FnOnce(&CatalogItem) -> Option<WritePlan> + Send>;

/// Result of an applied [`WritePlan`].
#[derive(Debug, Clone, PartialEq)]
pub struct LockedOutcome {
    /// The locked row after the writes.
    pub locked: CatalogItem,
    /// The inserted row, when the plan inserted one.
    pub inserted: Option<CatalogItem>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Fetch one row.
    async fn find_by_id(
        &self,
        kind: ItemKind,
        id: ItemId,
    ) -> Result<Option<CatalogItem>, ItemRepositoryError>;

    /// Fetch rows within `scope`, ordered by id.
    async fn find_many(
        &self,
        kind: ItemKind,
        scope: ListScope,
    ) -> Result<Vec<CatalogItem>, ItemRepositoryError>;

    /// Insert a row and return it with its assigned id.
    async fn create(&self, item: NewItem) -> Result<CatalogItem, ItemRepositoryError>;

    /// Apply a partial update; `None` when the row does not exist.
    async fn update(
        &self,
        id: ItemId,
        changes: ItemChanges,
    ) -> Result<Option<CatalogItem>, ItemRepositoryError>;

    /// Delete a row; `false` when it did not exist.
    async fn delete(&self, kind: ItemKind, id: ItemId) -> Result<bool, ItemRepositoryError>;

    /// Count rows by holder.
    async fn counts(&self, kind: ItemKind) -> Result<ItemCounts, ItemRepositoryError>;

    /// Lock the row exclusively, check `predicate`, and apply the plan
    /// returned by `mutation` atomically.
    ///
    /// Returns `Ok(None)` when the row is absent, fails the predicate, the
    /// mutation declines, or the plan cannot be applied to the current stock.
    async fn with_lock(
        &self,
        kind: ItemKind,
        id: ItemId,
        predicate: LockPredicate,
        mutation: LockedMutation,
    ) -> Result<Option<LockedOutcome>, ItemRepositoryError>;
}
