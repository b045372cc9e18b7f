//! In-process `AccountRepository` used when no database is configured.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::ports::{AccountRepository, AccountRepositoryError};
use crate::domain::{Account, AccountChanges, AccountId, EmailAddress, NewAccount};

#[derive(Debug, Default)]
struct AccountTable {
    rows: BTreeMap<AccountId, Account>,
    last_id: i64,
}

impl AccountTable {
    fn email_taken(&self, email: &EmailAddress, except: Option<AccountId>) -> bool {
        self.rows
            .values()
            .any(|account| &account.email == email && Some(account.id) != except)
    }
}

/// Mutex-guarded in-memory identity store.
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    table: Mutex<AccountTable>,
}

impl MemoryAccountRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, AccountTable>, AccountRepositoryError> {
        self.table
            .lock()
            .map_err(|_| AccountRepositoryError::query("account table lock poisoned"))
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        Ok(self.table()?.rows.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        Ok(self
            .table()?
            .rows
            .values()
            .find(|account| &account.email == email)
            .cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AccountRepositoryError> {
        let mut table = self.table()?;
        if table.email_taken(&account.email, None) {
            return Err(AccountRepositoryError::duplicate_email());
        }
        table.last_id += 1;
        let id = AccountId::new(table.last_id)
            .map_err(|err| AccountRepositoryError::query(err.to_string()))?;
        let now = Utc::now();
        let stored = Account {
            id,
            email: account.email,
            password_hash: account.password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            image: account.image,
            role: account.role,
            blocked: false,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: AccountId,
        changes: AccountChanges,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut table = self.table()?;
        if changes
            .email
            .as_ref()
            .is_some_and(|email| table.email_taken(email, Some(id)))
        {
            return Err(AccountRepositoryError::duplicate_email());
        }
        let Some(account) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            account.password_hash = password_hash;
        }
        if let Some(first_name) = changes.first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            account.last_name = last_name;
        }
        if let Some(image) = changes.image {
            account.image = Some(image);
        }
        if let Some(role) = changes.role {
            account.role = role;
        }
        if let Some(blocked) = changes.blocked {
            account.blocked = blocked;
        }
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn list(&self) -> Result<Vec<Account>, AccountRepositoryError> {
        Ok(self.table()?.rows.values().cloned().collect())
    }

    async fn count(&self) -> Result<u64, AccountRepositoryError> {
        Ok(self.table()?.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PasswordHash, PersonName, Role};
    use rstest::{fixture, rstest};

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: EmailAddress::new(email).expect("valid email"),
            password_hash: PasswordHash::from_phc("$argon2id$stub"),
            first_name: PersonName::new("Ada", "firstName").expect("valid name"),
            last_name: PersonName::new("Lovelace", "lastName").expect("valid name"),
            image: None,
            role: Role::User,
        }
    }

    #[fixture]
    fn repo() -> MemoryAccountRepository {
        MemoryAccountRepository::new()
    }

    #[rstest]
    #[tokio::test]
    async fn emails_are_unique(repo: MemoryAccountRepository) {
        repo.create(new_account("ada@example.com"))
            .await
            .expect("first");
        let err = repo
            .create(new_account("ADA@example.com"))
            .await
            .expect_err("duplicate");
        assert_eq!(err, AccountRepositoryError::duplicate_email());
    }

    #[rstest]
    #[tokio::test]
    async fn changing_to_a_taken_email_is_refused(repo: MemoryAccountRepository) {
        repo.create(new_account("ada@example.com"))
            .await
            .expect("first");
        let other = repo
            .create(new_account("grace@example.com"))
            .await
            .expect("second");
        let changes = AccountChanges {
            email: Some(EmailAddress::new("ada@example.com").expect("valid email")),
            ..AccountChanges::default()
        };
        let err = repo.update(other.id, changes).await.expect_err("taken");
        assert_eq!(err, AccountRepositoryError::duplicate_email());
    }

    #[rstest]
    #[tokio::test]
    async fn block_and_role_changes_persist(repo: MemoryAccountRepository) {
        let created = repo
            .create(new_account("ada@example.com"))
            .await
            .expect("created");
        let changes = AccountChanges {
            role: Some(Role::Manager),
            blocked: Some(true),
            ..AccountChanges::default()
        };
        repo.update(created.id, changes).await.expect("updated");

        let stored = repo
            .find_by_id(created.id)
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(stored.role, Role::Manager);
        assert!(stored.blocked);
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn updates_on_missing_accounts_return_none(repo: MemoryAccountRepository) {
        let missing = AccountId::new(99).expect("valid id");
        let outcome = repo
            .update(missing, AccountChanges::default())
            .await
            .expect("no error");
        assert!(outcome.is_none());
    }
}
