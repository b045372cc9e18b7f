//! Port abstraction for account persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Account, AccountChanges, AccountId, EmailAddress, NewAccount};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "account repository query failed: {message}",
        /// The email is already registered to another account.
        DuplicateEmail => "email address is already registered",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError>;

    /// Fetch an account by its normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError>;

    /// Insert an account.
    async fn create(&self, account: NewAccount) -> Result<Account, AccountRepositoryError>;

    /// Apply a partial update; `None` when the account does not exist.
    async fn update(
        &self,
        id: AccountId,
        changes: AccountChanges,
    ) -> Result<Option<Account>, AccountRepositoryError>;

    /// Every account, ordered by id.
    async fn list(&self) -> Result<Vec<Account>, AccountRepositoryError>;

    /// Number of accounts.
    async fn count(&self) -> Result<u64, AccountRepositoryError>;
}
