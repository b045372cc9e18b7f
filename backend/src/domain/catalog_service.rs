//! Catalogue service shared by the pet and product endpoints.
//!
//! Every operation resolves the owner of the target row, asks
//! [`decide`](super::decide) whether the caller may proceed, and only then
//! touches the item store. Purchases are delegated to the
//! [`OwnershipTransferEngine`].

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::ports::{AccountRepository, ItemRepository};
use super::{
    CatalogItem, Caller, Error, ItemChanges, ItemId, ItemKind, NewItem, Operation, Owner,
    OwnerFilter, OwnershipTransferEngine, RetryPolicy, decide, list_scope,
};

/// Catalogue reads, writes, and purchases under the access policy.
#[derive(Clone)]
pub struct CatalogService {
    items: Arc<dyn ItemRepository>,
    accounts: Arc<dyn AccountRepository>,
    engine: OwnershipTransferEngine,
}

impl CatalogService {
    /// Build the service; the transfer engine shares the item store.
    pub fn new(
        items: Arc<dyn ItemRepository>,
        accounts: Arc<dyn AccountRepository>,
        retry: RetryPolicy,
    ) -> Self {
        let engine = OwnershipTransferEngine::new(Arc::clone(&items), retry);
        Self {
            items,
            accounts,
            engine,
        }
    }

    /// List rows of `kind` visible to `caller` under `filter`.
    pub async fn list(
        &self,
        caller: &Caller,
        kind: ItemKind,
        filter: OwnerFilter,
    ) -> Result<Vec<CatalogItem>, Error> {
        let scope = list_scope(caller, filter)?;
        Ok(self.items.find_many(kind, scope).await?)
    }

    /// List the caller's own rows of `kind`.
    pub async fn list_own(&self, caller: &Caller, kind: ItemKind) -> Result<Vec<CatalogItem>, Error> {
        self.list(caller, kind, OwnerFilter::Me).await
    }

    /// Fetch one row the caller may read.
    pub async fn get(&self, caller: &Caller, kind: ItemKind, id: ItemId) -> Result<CatalogItem, Error> {
        let item = self.load(kind, id).await?;
        decide(Operation::ReadOne, caller, item.owner()).into_result()?;
        Ok(item)
    }

    /// Create a row.
    ///
    /// Plain users cannot choose a holder: their request is evaluated as a
    /// store listing, which the policy refuses. Privileged callers may name
    /// any existing account.
    pub async fn create(&self, caller: &Caller, item: NewItem) -> Result<CatalogItem, Error> {
        let principal = caller.require_principal()?;
        let item = if principal.role.is_privileged() {
            item
        } else {
            item.with_owner(Owner::Store)?
        };
        decide(Operation::Create, caller, item.owner()).into_result()?;
        self.ensure_owner_exists(item.owner()).await?;

        let created = self.items.create(item).await?;
        info!(
            kind = %created.kind(),
            item_id = %created.id(),
            owner = %created.owner(),
            actor = %principal.id,
            "catalogue item created"
        );
        Ok(created)
    }

    /// Apply a partial update.
    ///
    /// Owners may edit descriptive fields of their own rows; changing the
    /// holder or the stock needs a privileged caller.
    pub async fn update(
        &self,
        caller: &Caller,
        id: ItemId,
        changes: ItemChanges,
    ) -> Result<CatalogItem, Error> {
        let current = self.load(changes.kind(), id).await?;
        decide(Operation::Update, caller, current.owner()).into_result()?;
        if changes.is_empty() {
            return Err(Error::invalid_request("no changes supplied"));
        }
        if changes.touches_custody() {
            let principal = caller.require_principal()?;
            if !principal.role.is_privileged() {
                return Err(Error::forbidden("changing owner or stock requires a manager"));
            }
        }
        if let Some(owner) = changes.owner() {
            self.ensure_owner_exists(owner).await?;
        }
        changes.check_against(&current)?;

        let kind = changes.kind();
        self.items
            .update(id, changes)
            .await?
            .ok_or_else(|| not_found(kind, id))
    }

    /// Delete a row.
    pub async fn delete(&self, caller: &Caller, kind: ItemKind, id: ItemId) -> Result<(), Error> {
        let current = self.load(kind, id).await?;
        decide(Operation::Delete, caller, current.owner()).into_result()?;
        if !self.items.delete(kind, id).await? {
            return Err(not_found(kind, id));
        }
        info!(%kind, item_id = %id, "catalogue item deleted");
        Ok(())
    }

    /// Acquire a store-held pet, or one unit of a store-held product.
    ///
    /// Returns the row now owned by the caller.
    pub async fn buy(&self, caller: &Caller, kind: ItemKind, id: ItemId) -> Result<CatalogItem, Error> {
        decide(Operation::Transfer, caller, Owner::Store).into_result()?;
        let buyer = caller.require_principal()?.id;
        let acquired = match kind {
            ItemKind::Pet => CatalogItem::Pet(self.engine.acquire_instance(id, buyer).await?),
            ItemKind::Product => CatalogItem::Product(self.engine.acquire_unit(id, buyer).await?),
        };
        Ok(acquired)
    }

    async fn load(&self, kind: ItemKind, id: ItemId) -> Result<CatalogItem, Error> {
        self.items
            .find_by_id(kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))
    }

    async fn ensure_owner_exists(&self, owner: Owner) -> Result<(), Error> {
        let Owner::Account(account_id) = owner else {
            return Ok(());
        };
        if self.accounts.find_by_id(account_id).await?.is_none() {
            return Err(Error::invalid_request("owner does not reference an account")
                .with_details(json!({ "field": "ownerId", "code": "unknown_account" })));
        }
        Ok(())
    }
}

fn not_found(kind: ItemKind, id: ItemId) -> Error {
    Error::not_found(format!("{kind} {id} not found"))
}
