//! Ownership transfer engine.
//!
//! Moves an item, or one unit of it, from the store to a buyer inside a single
//! [`ItemRepository::with_lock`] critical section:
//!
//! - pets are non-divisible, so the locked row is reassigned in place;
//! - products are divisible, so the store row loses one unit and a new row
//!   with a stock of one is created for the buyer.
//!
//! Absent, already-owned, and sold-out items are indistinguishable to the
//! caller: all yield [`TransferError::NotAvailable`]. Lock contention is
//! retried a bounded number of times before it escalates.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::ports::{ItemRepository, ItemRepositoryError, LockPredicate, LockedMutation, WritePlan};
use super::{
    AccountId, CatalogItem, Error, ItemId, ItemKind, NewItem, Owner, Pet, Product, Stock,
};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(25);

/// Bounded retry for contended transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Build a policy; at least one attempt is always made.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause between attempts.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

/// Transfer failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// Absent, not held by the store, or out of stock.
    #[error("item is not available")]
    NotAvailable,
    /// The store failed, or contention outlasted the retry budget.
    #[error("transfer could not be persisted: {0}")]
    PersistenceFailure(ItemRepositoryError),
}

impl From<TransferError> for Error {
    fn from(value: TransferError) -> Self {
        match value {
            TransferError::NotAvailable => Error::not_found(value.to_string()),
            TransferError::PersistenceFailure(inner) => inner.into(),
        }
    }
}

/// Executes acquisitions against the item store.
#[derive(Clone)]
pub struct OwnershipTransferEngine {
    items: Arc<dyn ItemRepository>,
    retry: RetryPolicy,
}

impl OwnershipTransferEngine {
    /// Build an engine over the item store.
    pub fn new(items: Arc<dyn ItemRepository>, retry: RetryPolicy) -> Self {
        Self { items, retry }
    }

    /// Move a store-held pet to `buyer`, returning the refreshed row.
    pub async fn acquire_instance(
        &self,
        pet: ItemId,
        buyer: AccountId,
    ) -> Result<Pet, TransferError> {
        let outcome = self
            .run_locked(ItemKind::Pet, pet, LockPredicate::store_held(), move || {
                Box::new(move |row: &CatalogItem| match row {
                    CatalogItem::Pet(_) => Some(WritePlan::reassign(Owner::Account(buyer))),
                    CatalogItem::Product(_) => None,
                })
            })
            .await?;

        match outcome.locked {
            CatalogItem::Pet(acquired) => {
                info!(pet_id = %pet, buyer = %buyer, "pet acquired");
                Ok(acquired)
            }
            CatalogItem::Product(_) => Err(unexpected_row("locked row is not a pet")),
        }
    }

    /// Take one unit of a store-held product for `buyer`, returning the new
    /// owned row.
    pub async fn acquire_unit(
        &self,
        product: ItemId,
        buyer: AccountId,
    ) -> Result<Product, TransferError> {
        let outcome = self
            .run_locked(
                ItemKind::Product,
                product,
                LockPredicate::store_held_in_stock(),
                move || Box::new(move |row: &CatalogItem| split_unit_for(row, buyer)),
            )
            .await?;

        match outcome.inserted {
            Some(CatalogItem::Product(acquired)) => {
                info!(
                    product_id = %product,
                    owned_id = %acquired.id,
                    buyer = %buyer,
                    remaining = outcome.locked.stock().get(),
                    "product unit acquired"
                );
                Ok(acquired)
            }
            _ => Err(unexpected_row("no owned product row was created")),
        }
    }

    async fn run_locked<F>(
        &self,
        kind: ItemKind,
        id: ItemId,
        predicate: LockPredicate,
        mutation: F,
    ) -> Result<super::ports::LockedOutcome, TransferError>
    where
        F: Fn() -> LockedMutation + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            match self.items.with_lock(kind, id, predicate, mutation()).await {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {
                    debug!(%kind, item_id = %id, "item not available for transfer");
                    return Err(TransferError::NotAvailable);
                }
                Err(ItemRepositoryError::Contention { message })
                    if attempt < self.retry.max_attempts() =>
                {
                    warn!(%kind, item_id = %id, attempt, %message, "transfer contended; retrying");
                    tokio::time::sleep(self.retry.backoff()).await;
                    attempt += 1;
                }
                Err(failure) => {
                    error!(%kind, item_id = %id, attempt, error = %failure, "transfer failed");
                    return Err(TransferError::PersistenceFailure(failure));
                }
            }
        }
    }
}

fn split_unit_for(row: &CatalogItem, buyer: AccountId) -> Option<WritePlan> {
    let CatalogItem::Product(product) = row else {
        return None;
    };
    if !product.owner.is_store() || product.stock.get() == 0 {
        return None;
    }
    let owned = NewItem::product(
        Owner::Account(buyer),
        Stock::ONE,
        product.details.clone(),
    )
    .ok()?;
    Some(WritePlan::split_unit(owned))
}

fn unexpected_row(message: &str) -> TransferError {
    TransferError::PersistenceFailure(ItemRepositoryError::query(message))
}
