//! `DieselItemRepository` transfers against embedded PostgreSQL.
//!
//! Covers the row-locking path the in-memory store cannot: `FOR UPDATE`
//! serialisation, the conditional stock decrement, rollback of declined or
//! failing plans, the single-unit check on owned products, and lock timeouts
//! surfacing as contention.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use postgres::{Client, NoTls};
use rstest::{fixture, rstest};
use storefront::domain::ports::{
    AccountRepository, ItemRepository, ItemRepositoryError, LockPredicate, WritePlan,
};
use storefront::domain::{
    AccountId, EmailAddress, ItemId, ItemKind, NewAccount, NewItem, Owner,
    OwnershipTransferEngine, PasswordHash, PersonName, RetryPolicy, Role, Stock, TransferError,
};
use storefront::outbound::persistence::{
    DbPool, DieselAccountRepository, DieselItemRepository, PoolConfig,
};
use tokio::runtime::Runtime;

#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

#[path = "support/marketplace.rs"]
#[allow(dead_code, reason = "shared across suites; each uses a subset")]
mod marketplace;

use embedded_postgres::{handle_cluster_setup_failure, provision_database, shared_cluster};
use marketplace::{pet_details, product_details};

struct DbWorld {
    runtime: Runtime,
    items: DieselItemRepository,
    accounts: DieselAccountRepository,
    database_url: String,
    _database: TemporaryDatabase,
}

impl DbWorld {
    fn engine(&self) -> OwnershipTransferEngine {
        OwnershipTransferEngine::new(
            Arc::new(self.items.clone()),
            RetryPolicy::new(3, Duration::from_millis(5)),
        )
    }

    fn buyers(&self, count: usize) -> Vec<AccountId> {
        self.runtime.block_on(async {
            let mut ids = Vec::with_capacity(count);
            for n in 0..count {
                let account = self
                    .accounts
                    .create(NewAccount {
                        email: EmailAddress::new(format!("buyer{n}@example.com"))
                            .expect("valid email"),
                        password_hash: PasswordHash::from_phc(
                            "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA",
                        ),
                        first_name: PersonName::new("Ada", "firstName").expect("valid name"),
                        last_name: PersonName::new("Byron", "lastName").expect("valid name"),
                        image: None,
                        role: Role::User,
                    })
                    .await
                    .expect("buyer created");
                ids.push(account.id);
            }
            ids
        })
    }

    fn store_pet(&self) -> ItemId {
        self.runtime
            .block_on(self.items.create(NewItem::pet(Owner::Store, pet_details("Rex"))))
            .expect("pet created")
            .id()
    }

    fn store_product(&self, stock: i64) -> ItemId {
        let item = NewItem::product(
            Owner::Store,
            Stock::new(stock).expect("valid stock"),
            product_details("Kibble"),
        )
        .expect("valid product");
        self.runtime
            .block_on(self.items.create(item))
            .expect("product created")
            .id()
    }

    fn stock_of(&self, id: ItemId) -> u32 {
        self.runtime
            .block_on(self.items.find_by_id(ItemKind::Product, id))
            .expect("lookup succeeds")
            .expect("row exists")
            .stock()
            .get()
    }
}

fn setup_world() -> Result<DbWorld, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_database(cluster)?;
    let database_url = database.url().to_owned();
    let pool = runtime
        .block_on(DbPool::new(
            PoolConfig::new(database_url.as_str()).with_max_size(8),
        ))
        .map_err(|err| err.to_string())?;
    Ok(DbWorld {
        runtime,
        items: DieselItemRepository::new(pool.clone()),
        accounts: DieselAccountRepository::new(pool),
        database_url,
        _database: database,
    })
}

#[fixture]
fn db_world() -> Option<DbWorld> {
    match setup_world() {
        Ok(world) => Some(world),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn one_buyer_wins_a_contested_pet(db_world: Option<DbWorld>) {
    let Some(world) = db_world else {
        return;
    };
    let pet = world.store_pet();
    let buyers = world.buyers(8);
    let engine = world.engine();

    let outcomes = world.runtime.block_on(async {
        let attempts = buyers.iter().copied().map(|buyer| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.acquire_instance(pet, buyer).await })
        });
        join_all(attempts).await
    });
    let outcomes: Vec<_> = outcomes
        .into_iter()
        .map(|joined| joined.expect("task completes"))
        .collect();

    let winners: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|o| o.as_ref().err())
            .all(|err| *err == TransferError::NotAvailable)
    );
    let winner = winners.first().expect("a winner exists");
    let stored = world
        .runtime
        .block_on(world.items.find_by_id(ItemKind::Pet, pet))
        .expect("lookup succeeds")
        .expect("pet exists");
    assert_eq!(stored.owner(), winner.owner);
    assert!(matches!(stored.owner(), Owner::Account(_)));
}

#[rstest]
#[case(3, 8)]
#[case(4, 4)]
fn contested_units_are_never_oversold(
    db_world: Option<DbWorld>,
    #[case] stock: i64,
    #[case] buyer_count: usize,
) {
    let Some(world) = db_world else {
        return;
    };
    let product = world.store_product(stock);
    let buyers = world.buyers(buyer_count);
    let engine = world.engine();

    let outcomes = world.runtime.block_on(async {
        let attempts = buyers.iter().copied().map(|buyer| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.acquire_unit(product, buyer).await })
        });
        join_all(attempts).await
    });
    let acquired: Vec<_> = outcomes
        .into_iter()
        .map(|joined| joined.expect("task completes"))
        .filter_map(Result::ok)
        .collect();

    let expected = usize::try_from(stock).expect("small stock");
    assert_eq!(acquired.len(), expected.min(buyer_count));
    assert!(acquired.iter().all(|owned| owned.stock == Stock::ONE));
    assert_eq!(world.stock_of(product), 0);

    let counts = world
        .runtime
        .block_on(world.items.counts(ItemKind::Product))
        .expect("counts available");
    assert_eq!(counts.store, 1);
    assert_eq!(counts.owned as usize, acquired.len());
}

#[rstest]
fn declined_plans_leave_the_row_untouched(db_world: Option<DbWorld>) {
    let Some(world) = db_world else {
        return;
    };
    let product = world.store_product(2);

    let declined = world.runtime.block_on(world.items.with_lock(
        ItemKind::Product,
        product,
        LockPredicate::store_held_in_stock(),
        Box::new(|_| None),
    ));
    assert_eq!(declined, Ok(None));

    let overdrawn = world.runtime.block_on(world.items.with_lock(
        ItemKind::Product,
        product,
        LockPredicate::store_held_in_stock(),
        Box::new(|_| {
            Some(WritePlan {
                take_units: 3,
                ..WritePlan::default()
            })
        }),
    ));
    assert_eq!(overdrawn, Ok(None));
    assert_eq!(world.stock_of(product), 2);
}

#[rstest]
fn failed_inserts_roll_back_the_decrement(db_world: Option<DbWorld>) {
    let Some(world) = db_world else {
        return;
    };
    let product = world.store_product(2);
    let missing_buyer = AccountId::new(987_654).expect("valid id");

    let result = world.runtime.block_on(world.items.with_lock(
        ItemKind::Product,
        product,
        LockPredicate::store_held_in_stock(),
        Box::new(move |_| {
            let owned = NewItem::product(
                Owner::Account(missing_buyer),
                Stock::ONE,
                product_details("Kibble"),
            )
            .ok()?;
            Some(WritePlan::split_unit(owned))
        }),
    ));

    assert!(matches!(result, Err(ItemRepositoryError::Conflict { .. })));
    assert_eq!(world.stock_of(product), 2);
}

#[rstest]
fn owned_products_must_hold_a_single_unit(db_world: Option<DbWorld>) {
    let Some(world) = db_world else {
        return;
    };
    let product = world.store_product(3);
    let buyer = *world.buyers(1).first().expect("one buyer");

    let result = world.runtime.block_on(world.items.with_lock(
        ItemKind::Product,
        product,
        LockPredicate::store_held(),
        Box::new(move |_| Some(WritePlan::reassign(Owner::Account(buyer)))),
    ));

    let Err(ItemRepositoryError::Conflict { message }) = result else {
        panic!("expected a conflict, got {result:?}");
    };
    assert!(message.contains("products_owned_single_unit"));
    let stored = world
        .runtime
        .block_on(world.items.find_by_id(ItemKind::Product, product))
        .expect("lookup succeeds")
        .expect("row exists");
    assert!(stored.owner().is_store());
    assert_eq!(stored.stock().get(), 3);
}

#[rstest]
fn held_row_locks_surface_as_contention(db_world: Option<DbWorld>) {
    let Some(world) = db_world else {
        return;
    };
    let pet = world.store_pet();
    let buyer = *world.buyers(1).first().expect("one buyer");

    let mut client = Client::connect(world.database_url.as_str(), NoTls).expect("connects");
    let mut holder = client.transaction().expect("transaction starts");
    holder
        .execute("SELECT id FROM pets WHERE id = $1 FOR UPDATE", &[&pet.get()])
        .expect("row locked");

    let result = world.runtime.block_on(world.items.with_lock(
        ItemKind::Pet,
        pet,
        LockPredicate::store_held(),
        Box::new(move |_| Some(WritePlan::reassign(Owner::Account(buyer)))),
    ));
    holder.rollback().expect("rollback succeeds");

    assert!(matches!(result, Err(ItemRepositoryError::Contention { .. })));
    let stored = world
        .runtime
        .block_on(world.items.find_by_id(ItemKind::Pet, pet))
        .expect("lookup succeeds")
        .expect("pet exists");
    assert!(stored.owner().is_store());
}
