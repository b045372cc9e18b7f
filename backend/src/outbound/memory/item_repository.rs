//! In-process `ItemRepository` used when no database is configured.
//!
//! Both tables live behind one mutex. `with_lock` holds it for the whole
//! read-check-write sequence, so the plan is applied against exactly the
//! state the mutation inspected and no reader sees a half-applied plan.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::ports::{
    ItemRepository, ItemRepositoryError, LockPredicate, LockedMutation, LockedOutcome, WritePlan,
};
use crate::domain::{
    CatalogItem, ItemChanges, ItemCounts, ItemId, ItemKind, ListScope, NewItem, Owner, Pet,
    PetChanges, Product, ProductChanges, check_product_stock,
};

#[derive(Debug, Default)]
struct ItemTables {
    pets: BTreeMap<ItemId, Pet>,
    products: BTreeMap<ItemId, Product>,
    last_pet_id: i64,
    last_product_id: i64,
}

impl ItemTables {
    fn find(&self, kind: ItemKind, id: ItemId) -> Option<CatalogItem> {
        match kind {
            ItemKind::Pet => self.pets.get(&id).cloned().map(CatalogItem::Pet),
            ItemKind::Product => self.products.get(&id).cloned().map(CatalogItem::Product),
        }
    }

    fn insert(&mut self, item: NewItem) -> Result<CatalogItem, ItemRepositoryError> {
        let now = Utc::now();
        match item {
            NewItem::Pet { owner, details } => {
                let id = next_id(&mut self.last_pet_id)?;
                let pet = Pet {
                    id,
                    owner,
                    details,
                    created_at: now,
                    updated_at: now,
                };
                self.pets.insert(id, pet.clone());
                Ok(CatalogItem::Pet(pet))
            }
            NewItem::Product {
                owner,
                stock,
                details,
            } => {
                check_product_stock(owner, stock).map_err(conflict)?;
                let id = next_id(&mut self.last_product_id)?;
                let product = Product {
                    id,
                    owner,
                    stock,
                    details,
                    created_at: now,
                    updated_at: now,
                };
                self.products.insert(id, product.clone());
                Ok(CatalogItem::Product(product))
            }
        }
    }

    /// Stage the plan against a copy of the locked row; nothing is written
    /// unless every step succeeds.
    fn apply(
        &mut self,
        locked: CatalogItem,
        plan: WritePlan,
    ) -> Result<Option<LockedOutcome>, ItemRepositoryError> {
        let now = Utc::now();
        let staged = match locked {
            CatalogItem::Pet(mut pet) => {
                if plan.take_units > 0 {
                    return Ok(None);
                }
                if let Some(owner) = plan.reassign_to {
                    pet.owner = owner;
                }
                pet.updated_at = now;
                CatalogItem::Pet(pet)
            }
            CatalogItem::Product(mut product) => {
                let Some(stock) = product.stock.checked_take(plan.take_units) else {
                    return Ok(None);
                };
                let owner = plan.reassign_to.unwrap_or(product.owner);
                check_product_stock(owner, stock).map_err(conflict)?;
                product.stock = stock;
                product.owner = owner;
                product.updated_at = now;
                CatalogItem::Product(product)
            }
        };
        let inserted = plan.insert.map(|row| self.insert(row)).transpose()?;
        match &staged {
            CatalogItem::Pet(pet) => {
                self.pets.insert(pet.id, pet.clone());
            }
            CatalogItem::Product(product) => {
                self.products.insert(product.id, product.clone());
            }
        }
        Ok(Some(LockedOutcome {
            locked: staged,
            inserted,
        }))
    }
}

/// Mutex-guarded in-memory catalogue.
#[derive(Debug, Default)]
pub struct MemoryItemRepository {
    tables: Mutex<ItemTables>,
}

impl MemoryItemRepository {
    /// Create an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, ItemTables>, ItemRepositoryError> {
        self.tables
            .lock()
            .map_err(|_| ItemRepositoryError::query("item tables lock poisoned"))
    }
}

fn next_id(last: &mut i64) -> Result<ItemId, ItemRepositoryError> {
    *last += 1;
    ItemId::new(*last).map_err(|err| ItemRepositoryError::query(err.to_string()))
}

fn conflict(err: impl ToString) -> ItemRepositoryError {
    ItemRepositoryError::conflict(err.to_string())
}

fn in_scope(owner: Owner, scope: ListScope) -> bool {
    match scope {
        ListScope::All => true,
        ListScope::Store => owner.is_store(),
        ListScope::StoreAndAccount(id) => owner.is_store() || owner == Owner::Account(id),
        ListScope::Account(id) => owner == Owner::Account(id),
    }
}

fn tally(owners: impl Iterator<Item = Owner>) -> ItemCounts {
    owners.fold(ItemCounts::default(), |mut counts, owner| {
        counts.total += 1;
        if owner.is_store() {
            counts.store += 1;
        } else {
            counts.owned += 1;
        }
        counts
    })
}

fn apply_pet_changes(pet: &mut Pet, changes: PetChanges) {
    let details = &mut pet.details;
    if let Some(name) = changes.name {
        details.name = name;
    }
    if let Some(description) = changes.description {
        details.description = description;
    }
    if let Some(price) = changes.price {
        details.price = price;
    }
    if let Some(breed) = changes.breed {
        details.breed = breed;
    }
    if let Some(age) = changes.age {
        details.age = age;
    }
    if let Some(gender) = changes.gender {
        details.gender = gender;
    }
    if let Some(sterilized) = changes.sterilized {
        details.sterilized = sterilized;
    }
    if let Some(image) = changes.image {
        details.image = Some(image);
    }
    if let Some(owner) = changes.owner {
        pet.owner = owner;
    }
}

fn apply_product_changes(
    product: &mut Product,
    changes: ProductChanges,
) -> Result<(), ItemRepositoryError> {
    let owner = changes.owner.unwrap_or(product.owner);
    let stock = changes.stock.unwrap_or(product.stock);
    check_product_stock(owner, stock).map_err(conflict)?;
    product.owner = owner;
    product.stock = stock;

    let details = &mut product.details;
    if let Some(name) = changes.name {
        details.name = name;
    }
    if let Some(description) = changes.description {
        details.description = description;
    }
    if let Some(price) = changes.price {
        details.price = price;
    }
    if let Some(category) = changes.category {
        details.category = category;
    }
    if let Some(brand) = changes.brand {
        details.brand = Some(brand);
    }
    if let Some(image) = changes.image {
        details.image = Some(image);
    }
    if let Some(mass) = changes.mass {
        details.mass = mass;
    }
    Ok(())
}

#[async_trait]
impl ItemRepository for MemoryItemRepository {
    async fn find_by_id(
        &self,
        kind: ItemKind,
        id: ItemId,
    ) -> Result<Option<CatalogItem>, ItemRepositoryError> {
        Ok(self.tables()?.find(kind, id))
    }

    async fn find_many(
        &self,
        kind: ItemKind,
        scope: ListScope,
    ) -> Result<Vec<CatalogItem>, ItemRepositoryError> {
        let tables = self.tables()?;
        let rows = match kind {
            ItemKind::Pet => tables
                .pets
                .values()
                .filter(|pet| in_scope(pet.owner, scope))
                .cloned()
                .map(CatalogItem::Pet)
                .collect(),
            ItemKind::Product => tables
                .products
                .values()
                .filter(|product| in_scope(product.owner, scope))
                .cloned()
                .map(CatalogItem::Product)
                .collect(),
        };
        Ok(rows)
    }

    async fn create(&self, item: NewItem) -> Result<CatalogItem, ItemRepositoryError> {
        self.tables()?.insert(item)
    }

    async fn update(
        &self,
        id: ItemId,
        changes: ItemChanges,
    ) -> Result<Option<CatalogItem>, ItemRepositoryError> {
        let mut tables = self.tables()?;
        let now = Utc::now();
        match changes {
            ItemChanges::Pet(changes) => {
                let Some(pet) = tables.pets.get_mut(&id) else {
                    return Ok(None);
                };
                apply_pet_changes(pet, changes);
                pet.updated_at = now;
                Ok(Some(CatalogItem::Pet(pet.clone())))
            }
            ItemChanges::Product(changes) => {
                let Some(current) = tables.products.get(&id) else {
                    return Ok(None);
                };
                let mut product = current.clone();
                apply_product_changes(&mut product, changes)?;
                product.updated_at = now;
                tables.products.insert(id, product.clone());
                Ok(Some(CatalogItem::Product(product)))
            }
        }
    }

    async fn delete(&self, kind: ItemKind, id: ItemId) -> Result<bool, ItemRepositoryError> {
        let mut tables = self.tables()?;
        let removed = match kind {
            ItemKind::Pet => tables.pets.remove(&id).is_some(),
            ItemKind::Product => tables.products.remove(&id).is_some(),
        };
        Ok(removed)
    }

    async fn counts(&self, kind: ItemKind) -> Result<ItemCounts, ItemRepositoryError> {
        let tables = self.tables()?;
        let counts = match kind {
            ItemKind::Pet => tally(tables.pets.values().map(|pet| pet.owner)),
            ItemKind::Product => tally(tables.products.values().map(|product| product.owner)),
        };
        Ok(counts)
    }

    async fn with_lock(
        &self,
        kind: ItemKind,
        id: ItemId,
        predicate: LockPredicate,
        mutation: LockedMutation,
    ) -> Result<Option<LockedOutcome>, ItemRepositoryError> {
        let mut tables = self.tables()?;
        let Some(locked) = tables.find(kind, id) else {
            return Ok(None);
        };
        if !predicate.admits(&locked) {
            return Ok(None);
        }
        let Some(plan) = mutation(&locked) else {
            return Ok(None);
        };
        tables.apply(locked, plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{account_id, pet_details, product_details};
    use crate::domain::{Price, Stock};
    use rstest::{fixture, rstest};

    fn stock(raw: i64) -> Stock {
        Stock::new(raw).expect("valid stock")
    }

    #[fixture]
    fn repo() -> MemoryItemRepository {
        MemoryItemRepository::new()
    }

    async fn seed_product(repo: &MemoryItemRepository, units: i64) -> ItemId {
        let item = NewItem::product(Owner::Store, stock(units), product_details("Kibble"))
            .expect("store product");
        repo.create(item).await.expect("created").id()
    }

    async fn listed(repo: &MemoryItemRepository, scope: ListScope) -> usize {
        repo.find_many(ItemKind::Pet, scope)
            .await
            .expect("listed")
            .len()
    }

    #[rstest]
    #[tokio::test]
    async fn ids_are_assigned_per_kind(repo: MemoryItemRepository) {
        let pet = repo
            .create(NewItem::pet(Owner::Store, pet_details("Rex")))
            .await
            .expect("pet");
        let product = seed_product(&repo, 3).await;
        assert_eq!(pet.id().get(), 1);
        assert_eq!(product.get(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn listings_respect_the_scope(repo: MemoryItemRepository) {
        for owner in [Owner::Store, Owner::Account(account_id(7)), Owner::Account(account_id(8))] {
            repo.create(NewItem::pet(owner, pet_details("Rex")))
                .await
                .expect("created");
        }
        assert_eq!(listed(&repo, ListScope::All).await, 3);
        assert_eq!(listed(&repo, ListScope::Store).await, 1);
        assert_eq!(listed(&repo, ListScope::StoreAndAccount(account_id(7))).await, 2);
        assert_eq!(listed(&repo, ListScope::Account(account_id(8))).await, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn owned_products_with_stock_are_refused(repo: MemoryItemRepository) {
        let err = repo
            .create(NewItem::Product {
                owner: Owner::Account(account_id(7)),
                stock: stock(5),
                details: product_details("Kibble"),
            })
            .await
            .expect_err("rejected");
        assert!(matches!(err, ItemRepositoryError::Conflict { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn updates_touch_only_supplied_fields(repo: MemoryItemRepository) {
        let id = seed_product(&repo, 3).await;
        let changes = ItemChanges::Product(ProductChanges {
            price: Some(Price::new(30.0).expect("valid price")),
            ..ProductChanges::default()
        });
        let Some(CatalogItem::Product(updated)) =
            repo.update(id, changes).await.expect("updated")
        else {
            panic!("expected the product row");
        };
        assert_eq!(updated.details.price.get(), 30.0);
        assert_eq!(updated.details.name, product_details("Kibble").name);
        assert_eq!(updated.stock, stock(3));
    }

    #[rstest]
    #[tokio::test]
    async fn split_unit_decrements_and_inserts(repo: MemoryItemRepository) {
        let id = seed_product(&repo, 2).await;
        let buyer = Owner::Account(account_id(7));
        let outcome = repo
            .with_lock(
                ItemKind::Product,
                id,
                LockPredicate::store_held_in_stock(),
                Box::new(move |row: &CatalogItem| {
                    let CatalogItem::Product(product) = row else {
                        return None;
                    };
                    NewItem::product(buyer, Stock::ONE, product.details.clone())
                        .ok()
                        .map(WritePlan::split_unit)
                }),
            )
            .await
            .expect("locked")
            .expect("applied");

        assert_eq!(outcome.locked.stock(), Stock::ONE);
        let inserted = outcome.inserted.expect("owned row");
        assert_eq!(inserted.owner(), buyer);
        assert_eq!(
            repo.counts(ItemKind::Product).await.expect("counts"),
            ItemCounts {
                total: 2,
                store: 1,
                owned: 1
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn failed_predicates_write_nothing(repo: MemoryItemRepository) {
        let id = seed_product(&repo, 0).await;
        let outcome = repo
            .with_lock(
                ItemKind::Product,
                id,
                LockPredicate::store_held_in_stock(),
                Box::new(|_: &CatalogItem| -> Option<WritePlan> {
                    panic!("mutation must not run")
                }),
            )
            .await
            .expect("locked");
        assert!(outcome.is_none());
        assert_eq!(
            repo.counts(ItemKind::Product).await.expect("counts").total,
            1
        );
    }

    #[rstest]
    #[tokio::test]
    async fn oversized_takes_are_declined(repo: MemoryItemRepository) {
        let id = seed_product(&repo, 1).await;
        let outcome = repo
            .with_lock(
                ItemKind::Product,
                id,
                LockPredicate::default(),
                Box::new(|_: &CatalogItem| {
                    Some(WritePlan {
                        take_units: 2,
                        ..WritePlan::default()
                    })
                }),
            )
            .await
            .expect("locked");
        assert!(outcome.is_none());
        let row = repo
            .find_by_id(ItemKind::Product, id)
            .await
            .expect("found")
            .expect("present");
        assert_eq!(row.stock(), Stock::ONE);
    }

    #[rstest]
    #[tokio::test]
    async fn deletes_report_missing_rows(repo: MemoryItemRepository) {
        let id = seed_product(&repo, 1).await;
        assert!(repo.delete(ItemKind::Product, id).await.expect("deleted"));
        assert!(!repo.delete(ItemKind::Product, id).await.expect("no-op"));
    }
}
