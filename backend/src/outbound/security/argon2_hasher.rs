//! Argon2id password hashing in PHC string format.

use std::sync::OnceLock;

use argon2::{Algorithm, Argon2, Params, Version};
use argon2::password_hash::{
    Error as PhcError, PasswordHash as PhcHash, PasswordHasher as _, PasswordVerifier as _,
    SaltString,
};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::domain::ports::{PasswordHasher, PasswordHasherError};
use crate::domain::{Password, PasswordHash};

/// Argon2id with the crate's default cost parameters.
#[derive(Default)]
pub struct Argon2PasswordHasher {
    argon: Argon2<'static>,
    decoy: OnceLock<PasswordHash>,
}

impl Argon2PasswordHasher {
    /// Hasher with the recommended cost parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with explicit cost parameters. Hashes made with other
    /// parameters still verify, since the PHC string records its own.
    pub fn with_params(params: Params) -> Self {
        Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy: OnceLock::new(),
        }
    }

    fn hash_bytes(&self, secret: &[u8]) -> Result<PasswordHash, PasswordHasherError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon
            .hash_password(secret, &salt)
            .map(|hash| PasswordHash::from_phc(hash.to_string()))
            .map_err(|err| PasswordHasherError::hash(err.to_string()))
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHasherError> {
        self.hash_bytes(password.expose().as_bytes())
    }

    fn verify(&self, attempt: &str, hash: &PasswordHash) -> Result<bool, PasswordHasherError> {
        let parsed = PhcHash::new(hash.as_str()).map_err(|_| PasswordHasherError::malformed_hash())?;
        match self.argon.verify_password(attempt.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(err) => Err(PasswordHasherError::hash(err.to_string())),
        }
    }

    fn decoy_hash(&self) -> Result<PasswordHash, PasswordHasherError> {
        if let Some(decoy) = self.decoy.get() {
            return Ok(decoy.clone());
        }
        let mut secret = zeroize::Zeroizing::new([0_u8; 32]);
        OsRng.fill_bytes(&mut *secret);
        let decoy = self.hash_bytes(&*secret)?;
        Ok(self.decoy.get_or_init(|| decoy).clone())
    }
}
