//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AccountRepository, AccountRepositoryError};
use crate::domain::{
    Account, AccountChanges, AccountId, EmailAddress, ImageUrl, NewAccount, PasswordHash,
    PersonName, Role,
};

use super::diesel_error_mapping::{map_account_diesel_error, map_account_pool_error};
use super::models::{AccountRow, AccountUpdate, NewAccountRow};
use super::pool::DbPool;
use super::schema::accounts;

/// Diesel-backed implementation of the `AccountRepository` port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain account.
fn row_to_account(row: AccountRow) -> Result<Account, AccountRepositoryError> {
    let id = row.id;
    let invalid = move |err: String| {
        AccountRepositoryError::query(format!("accounts row {id} is invalid: {err}"))
    };
    Ok(Account {
        id: AccountId::new(row.id).map_err(|err| invalid(err.to_string()))?,
        email: EmailAddress::new(&row.email).map_err(|err| invalid(err.to_string()))?,
        password_hash: PasswordHash::from_phc(row.password_hash),
        first_name: PersonName::new(&row.first_name, "firstName")
            .map_err(|err| invalid(err.to_string()))?,
        last_name: PersonName::new(&row.last_name, "lastName")
            .map_err(|err| invalid(err.to_string()))?,
        image: row
            .image
            .as_deref()
            .map(ImageUrl::new)
            .transpose()
            .map_err(|err| invalid(err.to_string()))?,
        role: row
            .role
            .parse::<Role>()
            .map_err(|err| invalid(err.to_string()))?,
        blocked: row.blocked,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;
        accounts::table
            .find(id.get())
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_account_diesel_error)?
            .map(row_to_account)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;
        accounts::table
            .filter(accounts::email.eq(email.as_str()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_account_diesel_error)?
            .map(row_to_account)
            .transpose()
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;
        let row = NewAccountRow {
            email: account.email.as_str(),
            password_hash: account.password_hash.as_str(),
            first_name: account.first_name.as_str(),
            last_name: account.last_name.as_str(),
            image: account.image.as_ref().map(ImageUrl::as_str),
            role: account.role.as_str(),
        };
        let inserted = diesel::insert_into(accounts::table)
            .values(&row)
            .returning(AccountRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_account_diesel_error)?;
        row_to_account(inserted)
    }

    async fn update(
        &self,
        id: AccountId,
        changes: AccountChanges,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;
        let update = AccountUpdate {
            email: changes.email.as_ref().map(EmailAddress::as_str),
            password_hash: changes.password_hash.as_ref().map(PasswordHash::as_str),
            first_name: changes.first_name.as_ref().map(PersonName::as_str),
            last_name: changes.last_name.as_ref().map(PersonName::as_str),
            image: changes.image.as_ref().map(ImageUrl::as_str),
            role: changes.role.map(Role::as_str),
            blocked: changes.blocked,
            updated_at: Utc::now(),
        };
        diesel::update(accounts::table.find(id.get()))
            .set(&update)
            .returning(AccountRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_account_diesel_error)?
            .map(row_to_account)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;
        let rows: Vec<AccountRow> = accounts::table
            .select(AccountRow::as_select())
            .order_by(accounts::id)
            .load(&mut conn)
            .await
            .map_err(map_account_diesel_error)?;
        rows.into_iter().map(row_to_account).collect()
    }

    async fn count(&self) -> Result<u64, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_account_pool_error)?;
        let total: i64 = accounts::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_account_diesel_error)?;
        Ok(u64::try_from(total).unwrap_or_default())
    }
}
