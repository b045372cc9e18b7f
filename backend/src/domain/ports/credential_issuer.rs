//! Port for issuing and verifying signed, time-bound identity assertions.
//!
//! A verified credential only proves who the bearer was when it was issued.
//! The role it carries is advisory; authorisation always re-reads the account.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{AccountId, Role};

use super::define_port_error;

define_port_error! {
    /// Failures raised while issuing or verifying credentials.
    pub enum CredentialError {
        /// Signature, structure, or claims are not acceptable.
        Invalid => "credential is invalid",
        /// The credential is past its expiry.
        Expired => "credential has expired",
        /// The issuer could not produce a credential.
        Signing { message: String } => "credential could not be issued: {message}",
    }
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims recovered from a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedCredential {
    pub account_id: AccountId,
    pub role_claim: Role,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
pub trait CredentialIssuer: Send + Sync {
    /// Sign a token for `account_id` valid for `ttl`.
    fn issue(
        &self,
        account_id: AccountId,
        role: Role,
        ttl: Duration,
    ) -> Result<IssuedToken, CredentialError>;

    /// Check signature and expiry, returning the embedded claims.
    fn verify(&self, token: &str) -> Result<VerifiedCredential, CredentialError>;
}
