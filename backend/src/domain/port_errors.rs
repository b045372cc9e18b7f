//! Translation of driven-port failures into client-facing [`Error`]s.
//!
//! Connection problems surface as `service_unavailable`, other persistence
//! faults as redacted internal errors. Both are logged here so adapters and
//! services do not have to.

use tracing::{error, warn};

use super::Error;
use super::ports::{
    AccountRepositoryError, CredentialError, ItemRepositoryError, PasswordHasherError,
};

impl From<ItemRepositoryError> for Error {
    fn from(value: ItemRepositoryError) -> Self {
        match &value {
            ItemRepositoryError::Connection { .. } | ItemRepositoryError::Contention { .. } => {
                error!(error = %value, "catalogue store unavailable");
                Error::service_unavailable("catalogue is temporarily unavailable")
            }
            ItemRepositoryError::Conflict { message } => {
                warn!(error = %value, "catalogue write conflicted");
                Error::conflict(message.clone())
            }
            ItemRepositoryError::Query { .. } => {
                error!(error = %value, "catalogue query failed");
                Error::internal(value.to_string())
            }
        }
    }
}

impl From<AccountRepositoryError> for Error {
    fn from(value: AccountRepositoryError) -> Self {
        match &value {
            AccountRepositoryError::Connection { .. } => {
                error!(error = %value, "account store unavailable");
                Error::service_unavailable("accounts are temporarily unavailable")
            }
            AccountRepositoryError::DuplicateEmail => Error::conflict(value.to_string()),
            AccountRepositoryError::Query { .. } => {
                error!(error = %value, "account query failed");
                Error::internal(value.to_string())
            }
        }
    }
}

impl From<CredentialError> for Error {
    fn from(value: CredentialError) -> Self {
        match &value {
            CredentialError::Invalid | CredentialError::Expired => {
                Error::unauthorized(value.to_string())
            }
            CredentialError::Signing { .. } => {
                error!(error = %value, "credential issuance failed");
                Error::internal(value.to_string())
            }
        }
    }
}

impl From<PasswordHasherError> for Error {
    fn from(value: PasswordHasherError) -> Self {
        error!(error = %value, "password hashing failed");
        Error::internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(ItemRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(ItemRepositoryError::contention("row locked"), ErrorCode::ServiceUnavailable)]
    #[case(ItemRepositoryError::query("syntax"), ErrorCode::InternalError)]
    #[case(ItemRepositoryError::conflict("owned stock"), ErrorCode::Conflict)]
    fn item_failures_map_by_category(
        #[case] failure: ItemRepositoryError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(Error::from(failure).code(), expected);
    }

    #[rstest]
    #[case(AccountRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(AccountRepositoryError::query("syntax"), ErrorCode::InternalError)]
    #[case(AccountRepositoryError::duplicate_email(), ErrorCode::Conflict)]
    fn account_failures_map_by_category(
        #[case] failure: AccountRepositoryError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(Error::from(failure).code(), expected);
    }

    #[rstest]
    #[case(CredentialError::invalid(), ErrorCode::Unauthorized)]
    #[case(CredentialError::expired(), ErrorCode::Unauthorized)]
    #[case(CredentialError::signing("no key"), ErrorCode::InternalError)]
    fn credential_failures_map_by_category(
        #[case] failure: CredentialError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(Error::from(failure).code(), expected);
    }
}
