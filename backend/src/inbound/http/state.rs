//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data`. The services inside
//! depend only on domain ports, so tests build state over in-memory stores or
//! mocks without any I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountRepository, CredentialIssuer, ItemRepository, PasswordHasher};
use crate::domain::{AccountService, CallerGate, CatalogService, RetryPolicy, StatsService, TokenPolicy};

/// Parameter object bundling the driven ports the HTTP surface needs.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub items: Arc<dyn ItemRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub issuer: Arc<dyn CredentialIssuer>,
    pub hasher: Arc<dyn PasswordHasher>,
}

/// Tunables applied when building the services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpStateOptions {
    pub tokens: TokenPolicy,
    pub retry: RetryPolicy,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub gate: Arc<CallerGate>,
    pub catalog: Arc<CatalogService>,
    pub accounts: Arc<AccountService>,
    pub stats: Arc<StatsService>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports, HttpStateOptions::default())
    }
}

impl HttpState {
    /// Wire the services over `ports`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use storefront::inbound::http::state::{HttpState, HttpStateOptions, HttpStatePorts};
    /// use storefront::outbound::memory::{MemoryAccountRepository, MemoryItemRepository};
    /// use storefront::outbound::security::{Argon2PasswordHasher, JwtCredentialIssuer};
    ///
    /// let ports = HttpStatePorts {
    ///     items: Arc::new(MemoryItemRepository::new()),
    ///     accounts: Arc::new(MemoryAccountRepository::new()),
    ///     issuer: Arc::new(JwtCredentialIssuer::new(b"example-secret")),
    ///     hasher: Arc::new(Argon2PasswordHasher::new()),
    /// };
    /// let state = HttpState::new(ports, HttpStateOptions::default());
    /// let _catalog = state.catalog.clone();
    /// ```
    pub fn new(ports: HttpStatePorts, options: HttpStateOptions) -> Self {
        let HttpStatePorts {
            items,
            accounts,
            issuer,
            hasher,
        } = ports;
        let HttpStateOptions { tokens, retry } = options;
        Self {
            gate: Arc::new(CallerGate::new(issuer.clone(), accounts.clone())),
            catalog: Arc::new(CatalogService::new(items.clone(), accounts.clone(), retry)),
            accounts: Arc::new(AccountService::new(accounts.clone(), hasher, issuer, tokens)),
            stats: Arc::new(StatsService::new(items, accounts)),
        }
    }
}
