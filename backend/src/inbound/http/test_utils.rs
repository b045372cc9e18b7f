//! Test helpers for inbound HTTP components.
//!
//! [`TestWorld`] wires the real services over in-memory stores, a JWT issuer
//! with a fixed secret, and a cheap Argon2 configuration.

use std::sync::Arc;
use std::time::Duration;

use actix_web::App;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::{AUTHORIZATION, HeaderName};
use actix_web::web;

use crate::Trace;
use crate::domain::ports::{AccountRepository, CredentialIssuer, ItemRepository};
use crate::domain::test_support::{pet_details, product_details};
use crate::domain::{
    Account, AccountChanges, AccountId, EmailAddress, ItemId, NewAccount, NewItem, Owner,
    PasswordHash, PersonName, RetryPolicy, Role, Stock, TokenPolicy,
};
use crate::outbound::memory::{MemoryAccountRepository, MemoryItemRepository};
use crate::outbound::security::{Argon2PasswordHasher, JwtCredentialIssuer};

use super::api_scope;
use super::state::{HttpState, HttpStateOptions, HttpStatePorts};

const TEST_SECRET: &[u8] = b"storefront-test-secret";

/// In-memory marketplace behind the HTTP state.
pub(crate) struct TestWorld {
    items: Arc<MemoryItemRepository>,
    accounts: Arc<MemoryAccountRepository>,
    issuer: Arc<JwtCredentialIssuer>,
    state: web::Data<HttpState>,
}

impl TestWorld {
    pub(crate) fn new() -> Self {
        let items = Arc::new(MemoryItemRepository::new());
        let accounts = Arc::new(MemoryAccountRepository::new());
        let issuer = Arc::new(JwtCredentialIssuer::new(TEST_SECRET));
        let cheap = argon2::Params::new(1024, 1, 1, None).expect("valid argon2 params");
        let state = HttpState::new(
            HttpStatePorts {
                items: items.clone(),
                accounts: accounts.clone(),
                issuer: issuer.clone(),
                hasher: Arc::new(Argon2PasswordHasher::with_params(cheap)),
            },
            HttpStateOptions {
                tokens: TokenPolicy::default(),
                retry: RetryPolicy::new(3, Duration::from_millis(1)),
            },
        );
        Self {
            items,
            accounts,
            issuer,
            state: web::Data::new(state),
        }
    }

    pub(crate) fn state(&self) -> web::Data<HttpState> {
        self.state.clone()
    }

    pub(crate) fn items(&self) -> &MemoryItemRepository {
        &self.items
    }

    /// Insert an account directly, bypassing registration.
    pub(crate) async fn account(&self, email: &str, role: Role) -> Account {
        self.accounts
            .create(NewAccount {
                email: EmailAddress::new(email).expect("valid email"),
                password_hash: PasswordHash::from_phc("$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA"),
                first_name: PersonName::new("Test", "firstName").expect("valid name"),
                last_name: PersonName::new("Account", "lastName").expect("valid name"),
                image: None,
                role,
            })
            .await
            .expect("account created")
    }

    pub(crate) async fn block(&self, id: AccountId) {
        self.accounts
            .update(
                id,
                AccountChanges {
                    blocked: Some(true),
                    ..AccountChanges::default()
                },
            )
            .await
            .expect("update succeeds")
            .expect("account exists");
    }

    pub(crate) fn token_for(&self, id: AccountId, role: Role) -> String {
        self.issuer
            .issue(id, role, Duration::from_secs(600))
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

    pub(crate) async fn product(&self, name: &str, owner: Owner, stock: i64) -> ItemId {
        let item = NewItem::product(
            owner,
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

/// `Authorization` header for a bearer token.
pub(crate) fn bearer(token: &str) -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// The full API over `state`, wrapped in the tracing middleware.
pub(crate) fn test_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().wrap(Trace).app_data(state).service(api_scope())
}
