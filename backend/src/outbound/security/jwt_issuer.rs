//! HS256 bearer tokens via `jsonwebtoken`.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{CredentialError, CredentialIssuer, IssuedToken, VerifiedCredential};
use crate::domain::{AccountId, Role};

/// Registered and private claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies tokens with a shared HMAC secret.
pub struct JwtCredentialIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCredentialIssuer {
    /// Build an issuer over `secret`.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, CredentialError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|err| CredentialError::signing(err.to_string()))
    }
}

impl CredentialIssuer for JwtCredentialIssuer {
    fn issue(
        &self,
        account_id: AccountId,
        role: Role,
        ttl: Duration,
    ) -> Result<IssuedToken, CredentialError> {
        let issued_at = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|err| CredentialError::signing(err.to_string()))?;
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| CredentialError::signing("token lifetime overflows the clock"))?;
        let token = self.sign(&Claims {
            sub: account_id.to_string(),
            role: role.as_str().to_owned(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<VerifiedCredential, CredentialError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            match err.kind() {
                ErrorKind::ExpiredSignature => CredentialError::expired(),
                _ => CredentialError::invalid(),
            }
        })?;
        let claims = data.claims;
        let account_id = claims
            .sub
            .parse::<i64>()
            .ok()
            .and_then(|raw| AccountId::new(raw).ok())
            .ok_or_else(CredentialError::invalid)?;
        let role_claim = Role::from_str(&claims.role).map_err(|_| CredentialError::invalid())?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or_else(CredentialError::invalid)?;
        Ok(VerifiedCredential {
            account_id,
            role_claim,
            expires_at,
        })
    }
}
