//! In-memory marketplace shared by the integration suites.
//!
//! Wires the real services over the in-memory stores so scenarios exercise
//! the access policy and the transfer engine without a database.

use std::sync::Arc;
use std::time::Duration;

use storefront::domain::ports::{AccountRepository, CredentialIssuer, ItemRepository};
use storefront::domain::{
    Account, AccountChanges, AccountId, Description, EmailAddress, Gender, ItemId, ItemName,
    Label, Mass, NewAccount, NewItem, Owner, PasswordHash, PersonName, PetAge, PetDetails, Price,
    ProductDetails, RetryPolicy, Role, Stock,
};
use storefront::inbound::http::state::{HttpState, HttpStateOptions, HttpStatePorts};
use storefront::outbound::memory::{MemoryAccountRepository, MemoryItemRepository};
use storefront::outbound::security::{Argon2PasswordHasher, JwtCredentialIssuer};

const SECRET: &[u8] = b"integration-secret";

pub(crate) struct Marketplace {
    pub(crate) items: Arc<MemoryItemRepository>,
    accounts: Arc<MemoryAccountRepository>,
    issuer: Arc<JwtCredentialIssuer>,
    pub(crate) state: HttpState,
}

impl Marketplace {
    pub(crate) fn new() -> Self {
        let items = Arc::new(MemoryItemRepository::new());
        let accounts = Arc::new(MemoryAccountRepository::new());
        let issuer = Arc::new(JwtCredentialIssuer::new(SECRET));
        let state = HttpState::new(
            HttpStatePorts {
                items: items.clone(),
                accounts: accounts.clone(),
                issuer: issuer.clone(),
                hasher: Arc::new(Argon2PasswordHasher::new()),
            },
            HttpStateOptions {
                retry: RetryPolicy::new(5, Duration::from_millis(1)),
                ..HttpStateOptions::default()
            },
        );
        Self {
            items,
            accounts,
            issuer,
            state,
        }
    }

    pub(crate) async fn account(&self, email: &str, role: Role) -> Account {
        self.accounts
            .create(NewAccount {
                email: EmailAddress::new(email).expect("valid email"),
                password_hash: PasswordHash::from_phc("$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA"),
                first_name: PersonName::new("Grace", "firstName").expect("valid name"),
                last_name: PersonName::new("Hopper", "lastName").expect("valid name"),
                image: None,
                role,
            })
            .await
            .expect("account created")
    }

    async fn change(&self, id: AccountId, changes: AccountChanges) {
        self.accounts
            .update(id, changes)
            .await
            .expect("update succeeds")
            .expect("account exists");
    }

    pub(crate) async fn block(&self, id: AccountId) {
        self.change(
            id,
            AccountChanges {
                blocked: Some(true),
                ..AccountChanges::default()
            },
        )
        .await;
    }

    pub(crate) async fn set_role(&self, id: AccountId, role: Role) {
        self.change(
            id,
            AccountChanges {
                role: Some(role),
                ..AccountChanges::default()
            },
        )
        .await;
    }

    pub(crate) fn token_for(&self, account: &Account) -> String {
        self.issuer
            .issue(account.id, account.role, Duration::from_secs(600))
            .expect("token issued")
            .token
    }

    pub(crate) async fn pet(&self, name: &str, owner: Owner) -> ItemId {
        self.items
            .create(NewItem::pet(owner, pet_details(name)))
            .await
            .expect("pet created")
            .id()
    }

    pub(crate) async fn product(&self, name: &str, stock: i64) -> ItemId {
        let item = NewItem::product(
            Owner::Store,
            Stock::new(stock).expect("valid stock"),
            product_details(name),
        )
        .expect("valid product");
        self.items
            .create(item)
            .await
            .expect("product created")
            .id()
    }
}

pub(crate) fn pet_details(name: &str) -> PetDetails {
    PetDetails {
        name: ItemName::new(name).expect("valid name"),
        description: Description::new("Loves long walks").expect("valid description"),
        price: Price::new(250.0).expect("valid price"),
        breed: Label::new("Collie", "breed").expect("valid breed"),
        age: PetAge::new(3).expect("valid age"),
        gender: Gender::Male,
        sterilized: false,
        image: None,
    }
}

pub(crate) fn product_details(name: &str) -> ProductDetails {
    ProductDetails {
        name: ItemName::new(name).expect("valid name"),
        description: Description::new("Rope toy").expect("valid description"),
        price: Price::new(9.5).expect("valid price"),
        category: Label::new("Toys", "category").expect("valid category"),
        brand: None,
        image: None,
        mass: Mass::new(0.2).expect("valid mass"),
    }
}
