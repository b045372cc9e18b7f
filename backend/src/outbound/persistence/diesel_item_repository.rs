//! PostgreSQL-backed `ItemRepository` implementation using Diesel ORM.
//!
//! `with_lock` runs inside one transaction: the row is read with
//! `SELECT ... FOR UPDATE`, the predicate and mutation run against it, and the
//! resulting plan is written before commit. A declined plan rolls back, so
//! nothing the transaction touched becomes visible.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{
    ItemRepository, ItemRepositoryError, LockPredicate, LockedMutation, LockedOutcome, WritePlan,
};
use crate::domain::{
    CatalogItem, CatalogValidationError, Description, Gender, ImageUrl, ItemChanges, ItemCounts,
    ItemId, ItemKind, ItemName, Label, ListScope, Mass, NewItem, Owner, Pet, PetAge, PetDetails,
    Price, Product, ProductDetails, Stock,
};

use super::diesel_error_mapping::{map_item_diesel_error, map_item_pool_error};
use super::models::{
    NewPetRow, NewProductRow, PetRow, PetUpdate, ProductRow, ProductUpdate,
};
use super::pool::DbPool;
use super::schema::{pets, products};

/// Bound on how long a transfer waits for a contended row.
const LOCK_TIMEOUT_SQL: &str = "SET LOCAL lock_timeout = '2s'";

/// Diesel-backed implementation of the `ItemRepository` port.
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Either table's row.
enum ItemRow {
    Pet(PetRow),
    Product(ProductRow),
}

impl ItemRow {
    fn into_domain(self) -> Result<CatalogItem, ItemRepositoryError> {
        match self {
            Self::Pet(row) => pet_from_row(row).map(CatalogItem::Pet),
            Self::Product(row) => product_from_row(row).map(CatalogItem::Product),
        }
    }
}

/// Failure inside the locking transaction. `Declined` rolls back without
/// being an error for the caller.
enum LockError {
    Declined,
    Database(diesel::result::Error),
    Row(ItemRepositoryError),
}

impl From<diesel::result::Error> for LockError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Database(value)
    }
}

fn corrupt(table: &'static str, id: i64) -> impl Fn(CatalogValidationError) -> ItemRepositoryError {
    move |err| ItemRepositoryError::query(format!("{table} row {id} is invalid: {err}"))
}

fn image_from_column(raw: Option<&str>) -> Result<Option<ImageUrl>, CatalogValidationError> {
    raw.map(ImageUrl::new)
        .transpose()
        .map_err(CatalogValidationError::from)
}

fn pet_from_row(row: PetRow) -> Result<Pet, ItemRepositoryError> {
    let invalid = corrupt("pets", row.id);
    let details = PetDetails {
        name: ItemName::new(&row.name).map_err(&invalid)?,
        description: Description::new(&row.description).map_err(&invalid)?,
        price: Price::new(row.price).map_err(&invalid)?,
        breed: Label::new(&row.breed, "breed").map_err(&invalid)?,
        age: PetAge::new(i64::from(row.age)).map_err(&invalid)?,
        gender: row.gender.parse::<Gender>().map_err(&invalid)?,
        sterilized: row.sterilized,
        image: image_from_column(row.image.as_deref()).map_err(&invalid)?,
    };
    Ok(Pet {
        id: ItemId::new(row.id).map_err(&invalid)?,
        owner: Owner::from_column(row.owner_id).map_err(&invalid)?,
        details,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn product_from_row(row: ProductRow) -> Result<Product, ItemRepositoryError> {
    let invalid = corrupt("products", row.id);
    let details = ProductDetails {
        name: ItemName::new(&row.name).map_err(&invalid)?,
        description: Description::new(&row.description).map_err(&invalid)?,
        price: Price::new(row.price).map_err(&invalid)?,
        category: Label::new(&row.category, "category").map_err(&invalid)?,
        brand: row
            .brand
            .as_deref()
            .map(|brand| Label::new(brand, "brand"))
            .transpose()
            .map_err(&invalid)?,
        image: image_from_column(row.image.as_deref()).map_err(&invalid)?,
        mass: Mass::new(row.mass).map_err(&invalid)?,
    };
    Ok(Product {
        id: ItemId::new(row.id).map_err(&invalid)?,
        owner: Owner::from_column(row.owner_id).map_err(&invalid)?,
        stock: Stock::new(i64::from(row.stock)).map_err(&invalid)?,
        details,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// `Stock` never exceeds `i32::MAX`, so the fallback is unreachable.
fn stock_column(units: u32) -> i32 {
    i32::try_from(units).unwrap_or(i32::MAX)
}

async fn insert_row(conn: &mut AsyncPgConnection, item: &NewItem) -> QueryResult<ItemRow> {
    match item {
        NewItem::Pet { owner, details } => {
            let row = NewPetRow {
                owner_id: owner.as_column(),
                name: details.name.as_str(),
                description: details.description.as_str(),
                price: details.price.get(),
                breed: details.breed.as_str(),
                age: i16::from(details.age.get()),
                gender: details.gender.as_str(),
                sterilized: details.sterilized,
                image: details.image.as_ref().map(ImageUrl::as_str),
            };
            diesel::insert_into(pets::table)
                .values(&row)
                .returning(PetRow::as_returning())
                .get_result(conn)
                .await
                .map(ItemRow::Pet)
        }
        NewItem::Product {
            owner,
            stock,
            details,
        } => {
            let row = NewProductRow {
                owner_id: owner.as_column(),
                name: details.name.as_str(),
                description: details.description.as_str(),
                price: details.price.get(),
                category: details.category.as_str(),
                brand: details.brand.as_ref().map(Label::as_str),
                image: details.image.as_ref().map(ImageUrl::as_str),
                mass: details.mass.get(),
                stock: stock_column(stock.get()),
            };
            diesel::insert_into(products::table)
                .values(&row)
                .returning(ProductRow::as_returning())
                .get_result(conn)
                .await
                .map(ItemRow::Product)
        }
    }
}

async fn lock_row(
    conn: &mut AsyncPgConnection,
    kind: ItemKind,
    id: ItemId,
) -> Result<Option<CatalogItem>, LockError> {
    let row = match kind {
        ItemKind::Pet => pets::table
            .find(id.get())
            .select(PetRow::as_select())
            .for_update()
            .get_result(conn)
            .await
            .optional()?
            .map(ItemRow::Pet),
        ItemKind::Product => products::table
            .find(id.get())
            .select(ProductRow::as_select())
            .for_update()
            .get_result(conn)
            .await
            .optional()?
            .map(ItemRow::Product),
    };
    row.map(ItemRow::into_domain)
        .transpose()
        .map_err(LockError::Row)
}

async fn apply_plan(
    conn: &mut AsyncPgConnection,
    locked: &CatalogItem,
    plan: WritePlan,
) -> Result<LockedOutcome, LockError> {
    let now = Utc::now();
    let id = locked.id().get();
    let updated = match locked {
        CatalogItem::Pet(_) => {
            if plan.take_units > 0 {
                return Err(LockError::Declined);
            }
            diesel::update(pets::table.find(id))
                .set((
                    plan.reassign_to
                        .map(|owner| pets::owner_id.eq(owner.as_column())),
                    pets::updated_at.eq(now),
                ))
                .returning(PetRow::as_returning())
                .get_result(conn)
                .await
                .optional()?
                .map(ItemRow::Pet)
        }
        CatalogItem::Product(_) => {
            let units = stock_column(plan.take_units);
            diesel::update(products::table.find(id).filter(products::stock.ge(units)))
                .set((
                    products::stock.eq(products::stock - units),
                    plan.reassign_to
                        .map(|owner| products::owner_id.eq(owner.as_column())),
                    products::updated_at.eq(now),
                ))
                .returning(ProductRow::as_returning())
                .get_result(conn)
                .await
                .optional()?
                .map(ItemRow::Product)
        }
    };
    let Some(updated) = updated else {
        return Err(LockError::Declined);
    };
    let locked = updated.into_domain().map_err(LockError::Row)?;

    let inserted = match &plan.insert {
        Some(item) => Some(
            insert_row(conn, item)
                .await?
                .into_domain()
                .map_err(LockError::Row)?,
        ),
        None => None,
    };
    Ok(LockedOutcome { locked, inserted })
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn find_by_id(
        &self,
        kind: ItemKind,
        id: ItemId,
    ) -> Result<Option<CatalogItem>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_item_pool_error)?;
        let row = match kind {
            ItemKind::Pet => pets::table
                .find(id.get())
                .select(PetRow::as_select())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_item_diesel_error)?
                .map(ItemRow::Pet),
            ItemKind::Product => products::table
                .find(id.get())
                .select(ProductRow::as_select())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_item_diesel_error)?
                .map(ItemRow::Product),
        };
        row.map(ItemRow::into_domain).transpose()
    }

    async fn find_many(
        &self,
        kind: ItemKind,
        scope: ListScope,
    ) -> Result<Vec<CatalogItem>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_item_pool_error)?;
        match kind {
            ItemKind::Pet => {
                let query = pets::table
                    .select(PetRow::as_select())
                    .order_by(pets::id)
                    .into_boxed();
                let query = match scope {
                    ListScope::All => query,
                    ListScope::Store => query.filter(pets::owner_id.is_null()),
                    ListScope::StoreAndAccount(account) => query.filter(
                        pets::owner_id
                            .is_null()
                            .or(pets::owner_id.eq(account.get())),
                    ),
                    ListScope::Account(account) => query.filter(pets::owner_id.eq(account.get())),
                };
                let rows: Vec<PetRow> = query
                    .load(&mut conn)
                    .await
                    .map_err(map_item_diesel_error)?;
                rows.into_iter()
                    .map(|row| pet_from_row(row).map(CatalogItem::Pet))
                    .collect()
            }
            ItemKind::Product => {
                let query = products::table
                    .select(ProductRow::as_select())
                    .order_by(products::id)
                    .into_boxed();
                let query = match scope {
                    ListScope::All => query,
                    ListScope::Store => query.filter(products::owner_id.is_null()),
                    ListScope::StoreAndAccount(account) => query.filter(
                        products::owner_id
                            .is_null()
                            .or(products::owner_id.eq(account.get())),
                    ),
                    ListScope::Account(account) => {
                        query.filter(products::owner_id.eq(account.get()))
                    }
                };
                let rows: Vec<ProductRow> = query
                    .load(&mut conn)
                    .await
                    .map_err(map_item_diesel_error)?;
                rows.into_iter()
                    .map(|row| product_from_row(row).map(CatalogItem::Product))
                    .collect()
            }
        }
    }

    async fn create(&self, item: NewItem) -> Result<CatalogItem, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_item_pool_error)?;
        insert_row(&mut conn, &item)
            .await
            .map_err(map_item_diesel_error)?
            .into_domain()
    }

    async fn update(
        &self,
        id: ItemId,
        changes: ItemChanges,
    ) -> Result<Option<CatalogItem>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_item_pool_error)?;
        let now = Utc::now();
        let row = match &changes {
            ItemChanges::Pet(changes) => {
                let update = PetUpdate {
                    owner_id: changes.owner.map(Owner::as_column),
                    name: changes.name.as_ref().map(ItemName::as_str),
                    description: changes.description.as_ref().map(Description::as_str),
                    price: changes.price.map(Price::get),
                    breed: changes.breed.as_ref().map(Label::as_str),
                    age: changes.age.map(|age| i16::from(age.get())),
                    gender: changes.gender.map(Gender::as_str),
                    sterilized: changes.sterilized,
                    image: changes.image.as_ref().map(ImageUrl::as_str),
                    updated_at: Some(now),
                };
                diesel::update(pets::table.find(id.get()))
                    .set(&update)
                    .returning(PetRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .optional()
                    .map_err(map_item_diesel_error)?
                    .map(ItemRow::Pet)
            }
            ItemChanges::Product(changes) => {
                let update = ProductUpdate {
                    owner_id: changes.owner.map(Owner::as_column),
                    name: changes.name.as_ref().map(ItemName::as_str),
                    description: changes.description.as_ref().map(Description::as_str),
                    price: changes.price.map(Price::get),
                    category: changes.category.as_ref().map(Label::as_str),
                    brand: changes.brand.as_ref().map(Label::as_str),
                    image: changes.image.as_ref().map(ImageUrl::as_str),
                    mass: changes.mass.map(Mass::get),
                    stock: changes.stock.map(|stock| stock_column(stock.get())),
                    updated_at: Some(now),
                };
                diesel::update(products::table.find(id.get()))
                    .set(&update)
                    .returning(ProductRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .optional()
                    .map_err(map_item_diesel_error)?
                    .map(ItemRow::Product)
            }
        };
        row.map(ItemRow::into_domain).transpose()
    }

    async fn delete(&self, kind: ItemKind, id: ItemId) -> Result<bool, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_item_pool_error)?;
        let affected = match kind {
            ItemKind::Pet => diesel::delete(pets::table.find(id.get()))
                .execute(&mut conn)
                .await,
            ItemKind::Product => diesel::delete(products::table.find(id.get()))
                .execute(&mut conn)
                .await,
        }
        .map_err(map_item_diesel_error)?;
        Ok(affected > 0)
    }

    async fn counts(&self, kind: ItemKind) -> Result<ItemCounts, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_item_pool_error)?;
        let (total, store): (i64, i64) = match kind {
            ItemKind::Pet => {
                let total = pets::table.count().get_result(&mut conn).await;
                let store = pets::table
                    .filter(pets::owner_id.is_null())
                    .count()
                    .get_result(&mut conn)
                    .await;
                (
                    total.map_err(map_item_diesel_error)?,
                    store.map_err(map_item_diesel_error)?,
                )
            }
            ItemKind::Product => {
                let total = products::table.count().get_result(&mut conn).await;
                let store = products::table
                    .filter(products::owner_id.is_null())
                    .count()
                    .get_result(&mut conn)
                    .await;
                (
                    total.map_err(map_item_diesel_error)?,
                    store.map_err(map_item_diesel_error)?,
                )
            }
        };
        let total = u64::try_from(total).unwrap_or_default();
        let store = u64::try_from(store).unwrap_or_default();
        Ok(ItemCounts {
            total,
            store,
            owned: total.saturating_sub(store),
        })
    }

    async fn with_lock(
        &self,
        kind: ItemKind,
        id: ItemId,
        predicate: LockPredicate,
        mutation: LockedMutation,
    ) -> Result<Option<LockedOutcome>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_item_pool_error)?;
        let result = conn
            .transaction::<_, LockError, _>(|conn| {
                async move {
                    diesel::sql_query(LOCK_TIMEOUT_SQL).execute(conn).await?;
                    let Some(locked) = lock_row(conn, kind, id).await? else {
                        return Err(LockError::Declined);
                    };
                    if !predicate.admits(&locked) {
                        return Err(LockError::Declined);
                    }
                    let Some(plan) = mutation(&locked) else {
                        return Err(LockError::Declined);
                    };
                    apply_plan(conn, &locked, plan).await
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(outcome) => Ok(Some(outcome)),
            Err(LockError::Declined) => Ok(None),
            Err(LockError::Database(err)) => Err(map_item_diesel_error(err)),
            Err(LockError::Row(err)) => Err(err),
        }
    }
}
