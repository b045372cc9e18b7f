//! Shared Diesel error classification for the marketplace repositories.
//!
//! Diesel reports failures per database error kind; repositories care about a
//! handful of categories. Classification happens once here and each adapter
//! maps the categories into its own port error.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::{AccountRepositoryError, ItemRepositoryError};

use super::pool::PoolError;

/// Coarse failure categories the ports distinguish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum DbFailure {
    Connection(String),
    Contention(String),
    CheckViolation(String),
    ForeignKeyViolation(String),
    UniqueViolation(String),
    Query(String),
}

/// Extract a readable message from a pool error.
pub(super) fn pool_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

fn is_lock_contention(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("deadlock detected")
        || lower.contains("lock timeout")
        || lower.contains("could not obtain lock")
}

/// Classify a Diesel error, logging the database detail at debug level.
pub(super) fn classify(error: DieselError) -> DbFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DbFailure::Query("record not found".into()),
        DieselError::QueryBuilderError(_) => DbFailure::Query("database query error".into()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DbFailure::Connection("database connection error".into())
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            DbFailure::Contention("serialization failure".into())
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
            DbFailure::CheckViolation(constraint_label(info.constraint_name()))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            DbFailure::ForeignKeyViolation(constraint_label(info.constraint_name()))
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DbFailure::UniqueViolation(constraint_label(info.constraint_name()))
        }
        DieselError::DatabaseError(_, info) if is_lock_contention(info.message()) => {
            DbFailure::Contention("row lock contention".into())
        }
        _ => DbFailure::Query("database error".into()),
    }
}

fn constraint_label(constraint: Option<&str>) -> String {
    constraint.map_or_else(|| "constraint violated".to_owned(), |name| format!("{name} violated"))
}

/// Map pool errors to item repository errors.
pub(super) fn map_item_pool_error(error: PoolError) -> ItemRepositoryError {
    ItemRepositoryError::connection(pool_message(error))
}

/// Map Diesel errors to item repository errors.
pub(super) fn map_item_diesel_error(error: DieselError) -> ItemRepositoryError {
    match classify(error) {
        DbFailure::Connection(message) => ItemRepositoryError::connection(message),
        DbFailure::Contention(message) => ItemRepositoryError::contention(message),
        DbFailure::CheckViolation(message) | DbFailure::ForeignKeyViolation(message) => {
            ItemRepositoryError::conflict(message)
        }
        DbFailure::UniqueViolation(message) | DbFailure::Query(message) => {
            ItemRepositoryError::query(message)
        }
    }
}

/// Map pool errors to account repository errors.
pub(super) fn map_account_pool_error(error: PoolError) -> AccountRepositoryError {
    AccountRepositoryError::connection(pool_message(error))
}

/// Map Diesel errors to account repository errors.
pub(super) fn map_account_diesel_error(error: DieselError) -> AccountRepositoryError {
    match classify(error) {
        DbFailure::Connection(message) => AccountRepositoryError::connection(message),
        DbFailure::UniqueViolation(_) => AccountRepositoryError::duplicate_email(),
        DbFailure::Contention(message)
        | DbFailure::CheckViolation(message)
        | DbFailure::ForeignKeyViolation(message)
        | DbFailure::Query(message) => AccountRepositoryError::query(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn not_found_is_a_query_failure() {
        assert_eq!(
            classify(DieselError::NotFound),
            DbFailure::Query("record not found".into())
        );
    }

    #[rstest]
    #[case("deadlock detected", true)]
    #[case("canceling statement due to lock timeout", true)]
    #[case("could not obtain lock on row in relation \"pets\"", true)]
    #[case("syntax error at or near", false)]
    fn lock_messages_are_contention(#[case] message: &str, #[case] expected: bool) {
        assert_eq!(is_lock_contention(message), expected);
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        assert_eq!(
            map_item_pool_error(PoolError::checkout("timed out")),
            ItemRepositoryError::connection("timed out")
        );
        assert_eq!(
            map_account_pool_error(PoolError::build("bad url")),
            AccountRepositoryError::connection("bad url")
        );
    }

    #[rstest]
    fn constraint_names_are_reported() {
        assert_eq!(
            constraint_label(Some("products_owned_single_unit")),
            "products_owned_single_unit violated"
        );
        assert_eq!(constraint_label(None), "constraint violated");
    }
}
