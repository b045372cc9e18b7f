//! Port for one-way password hashing.

use crate::domain::{Password, PasswordHash};

use super::define_port_error;

define_port_error! {
    /// Failures raised by password hashing adapters.
    pub enum PasswordHasherError {
        /// Hashing failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// A stored hash could not be parsed.
        MalformedHash => "stored password hash is malformed",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a password that passed the strength policy.
    fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHasherError>;

    /// Check a plaintext attempt against a stored hash.
    fn verify(&self, attempt: &str, hash: &PasswordHash) -> Result<bool, PasswordHasherError>;

    /// Hash of an unguessable secret made with this adapter's own cost
    /// parameters. Logins for unknown emails verify against it so they take
    /// as long as a wrong password.
    fn decoy_hash(&self) -> Result<PasswordHash, PasswordHasherError>;
}
