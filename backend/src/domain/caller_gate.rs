//! Resolve a presented bearer credential into a [`Caller`].
//!
//! A valid signature is not enough: the account is re-read on every request so
//! a block, a role change, or a deletion takes effect immediately, even for
//! tokens issued before the change.

use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::{AccountRepository, CredentialIssuer};
use super::{Caller, Error};

/// Role and block gate in front of every operation.
#[derive(Clone)]
pub struct CallerGate {
    issuer: Arc<dyn CredentialIssuer>,
    accounts: Arc<dyn AccountRepository>,
}

impl CallerGate {
    /// Build a gate over the issuer and the identity store.
    pub fn new(issuer: Arc<dyn CredentialIssuer>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { issuer, accounts }
    }

    /// Resolve the caller for an optional bearer token.
    ///
    /// No token yields [`Caller::Anonymous`]. An invalid or expired token, or
    /// one naming a missing account, is `unauthorized`; a blocked account is
    /// `forbidden`. The role comes from the stored account, never the claim.
    pub async fn resolve(&self, bearer: Option<&str>) -> Result<Caller, Error> {
        let Some(token) = bearer else {
            return Ok(Caller::Anonymous);
        };

        let credential = self.issuer.verify(token)?;
        let Some(account) = self.accounts.find_by_id(credential.account_id).await? else {
            warn!(account_id = %credential.account_id, "credential names a missing account");
            return Err(Error::unauthorized("account no longer exists"));
        };

        if account.blocked {
            debug!(account_id = %account.id, "blocked account rejected");
            return Err(Error::forbidden("account is blocked"));
        }
        if account.role != credential.role_claim {
            debug!(
                account_id = %account.id,
                claimed = %credential.role_claim,
                stored = %account.role,
                "token role claim is stale; using stored role"
            );
        }

        Ok(Caller::principal(account.id, account.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        AccountRepositoryError, CredentialError, MockAccountRepository, MockCredentialIssuer,
        VerifiedCredential,
    };
    use crate::domain::test_support::sample_account;
    use crate::domain::{AccountId, ErrorCode, Role};
    use chrono::Utc;
    use rstest::rstest;

    fn credential(id: i64, role: Role) -> VerifiedCredential {
        VerifiedCredential {
            account_id: AccountId::new(id).expect("valid id"),
            role_claim: role,
            expires_at: Utc::now(),
        }
    }

    fn gate(issuer: MockCredentialIssuer, accounts: MockAccountRepository) -> CallerGate {
        CallerGate::new(Arc::new(issuer), Arc::new(accounts))
    }

    #[rstest]
    #[tokio::test]
    async fn missing_token_is_anonymous() {
        let gate = gate(MockCredentialIssuer::new(), MockAccountRepository::new());
        assert_eq!(gate.resolve(None).await.expect("resolves"), Caller::Anonymous);
    }

    #[rstest]
    #[case(CredentialError::invalid())]
    #[case(CredentialError::expired())]
    #[tokio::test]
    async fn unusable_tokens_are_unauthorised(#[case] failure: CredentialError) {
        let mut issuer = MockCredentialIssuer::new();
        issuer
            .expect_verify()
            .returning(move |_| Err(failure.clone()));
        let gate = gate(issuer, MockAccountRepository::new());

        let err = gate.resolve(Some("token")).await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn stored_role_overrides_the_claim() {
        let mut issuer = MockCredentialIssuer::new();
        issuer
            .expect_verify()
            .returning(|_| Ok(credential(7, Role::User)));
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_account(id.get(), Role::Manager, false))));

        let caller = gate(issuer, accounts)
            .resolve(Some("token"))
            .await
            .expect("resolves");
        assert_eq!(
            caller,
            Caller::principal(AccountId::new(7).expect("valid id"), Role::Manager)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn blocked_accounts_are_forbidden_despite_a_valid_token() {
        let mut issuer = MockCredentialIssuer::new();
        issuer
            .expect_verify()
            .returning(|_| Ok(credential(7, Role::User)));
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_account(id.get(), Role::User, true))));

        let err = gate(issuer, accounts)
            .resolve(Some("token"))
            .await
            .expect_err("blocked");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn vanished_accounts_are_unauthorised() {
        let mut issuer = MockCredentialIssuer::new();
        issuer
            .expect_verify()
            .returning(|_| Ok(credential(7, Role::Admin)));
        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_by_id().returning(|_| Ok(None));

        let err = gate(issuer, accounts)
            .resolve(Some("token"))
            .await
            .expect_err("missing account");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn identity_store_outage_is_service_unavailable() {
        let mut issuer = MockCredentialIssuer::new();
        issuer
            .expect_verify()
            .returning(|_| Ok(credential(7, Role::User)));
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_id()
            .returning(|_| Err(AccountRepositoryError::connection("refused")));

        let err = gate(issuer, accounts)
            .resolve(Some("token"))
            .await
            .expect_err("outage");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
