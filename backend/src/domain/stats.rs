//! Public marketplace counters.

use std::sync::Arc;

use super::ports::{AccountRepository, ItemRepository};
use super::{Error, ItemCounts, ItemKind};

/// Snapshot of catalogue and account totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketplaceStats {
    pub accounts: u64,
    pub pets: ItemCounts,
    pub products: ItemCounts,
}

/// Reads counters from both stores.
#[derive(Clone)]
pub struct StatsService {
    items: Arc<dyn ItemRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl StatsService {
    pub fn new(items: Arc<dyn ItemRepository>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { items, accounts }
    }

    /// Current totals. Each counter is read independently, so the snapshot
    /// is not transactional across kinds.
    pub async fn snapshot(&self) -> Result<MarketplaceStats, Error> {
        let accounts = self.accounts.count().await?;
        let pets = self.items.counts(ItemKind::Pet).await?;
        let products = self.items.counts(ItemKind::Product).await?;
        Ok(MarketplaceStats {
            accounts,
            pets,
            products,
        })
    }
}
