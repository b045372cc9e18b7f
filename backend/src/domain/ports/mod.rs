//! Driven ports the domain depends on.
//!
//! Adapters under `crate::outbound` implement these traits; services receive
//! them as `Arc<dyn Port>` so tests can swap in in-memory stores or mocks.

mod account_repository;
mod credential_issuer;
mod item_repository;
mod macros;
mod password_hasher;

pub(crate) use macros::define_port_error;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountRepository, AccountRepositoryError};
#[cfg(test)]
pub use credential_issuer::MockCredentialIssuer;
pub use credential_issuer::{CredentialError, CredentialIssuer, IssuedToken, VerifiedCredential};
#[cfg(test)]
pub use item_repository::MockItemRepository;
pub use item_repository::{
    ItemRepository, ItemRepositoryError, LockPredicate, LockedMutation, LockedOutcome, WritePlan,
};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
