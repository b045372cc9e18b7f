//! Account identity, roles, and credential primitives.
//!
//! Accounts are created by registration, never hard-deleted, and carry the
//! role and block flag that every authenticated request is re-checked against.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::json;
use zeroize::Zeroizing;

use super::{Error, ImageUrl, ImageUrlError};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const EMAIL_MAX: usize = 254;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

/// Validation failures for account input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    /// Identifiers are positive integers.
    #[error("account id must be a positive integer")]
    InvalidId,
    /// Email does not look like `local@domain.tld`.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Email longer than the storage limit.
    #[error("email must be at most {EMAIL_MAX} characters")]
    EmailTooLong,
    /// A name field is out of bounds.
    #[error("{field} must be between {NAME_MIN} and {NAME_MAX} characters")]
    NameLength {
        /// Offending field.
        field: &'static str,
    },
    /// Password fails the strength policy.
    #[error("password {reason}")]
    WeakPassword {
        /// Which rule failed.
        reason: &'static str,
    },
    /// Image URL rejected.
    #[error("{0}")]
    Image(#[from] ImageUrlError),
    /// Role outside the closed set.
    #[error("role must be one of user, manager, admin")]
    UnknownRole,
}

impl AccountValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::InvalidEmail | Self::EmailTooLong => "email",
            Self::NameLength { field } => *field,
            Self::WeakPassword { .. } => "password",
            Self::Image(_) => "image",
            Self::UnknownRole => "role",
        }
    }

    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
            Self::InvalidEmail => "invalid_email",
            Self::EmailTooLong => "too_long",
            Self::NameLength { .. } => "invalid_length",
            Self::WeakPassword { .. } => "weak_password",
            Self::Image(_) => "invalid_url",
            Self::UnknownRole => "unknown_role",
        }
    }
}

impl From<AccountValidationError> for Error {
    fn from(value: AccountValidationError) -> Self {
        Error::invalid_request(value.to_string())
            .with_details(json!({ "field": value.field(), "code": value.code() }))
    }
}

/// Stable account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(i64);

impl AccountId {
    /// Validate a raw identifier.
    pub fn new(raw: i64) -> Result<Self, AccountValidationError> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(AccountValidationError::InvalidId)
        }
    }

    /// Raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Regular customer.
    #[default]
    User,
    /// Store staff managing the catalogue.
    Manager,
    /// Full administrative rights, including account management.
    Admin,
}

impl Role {
    /// Stable lower-case name used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Managers and admins may administer the catalogue.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

impl FromStr for Role {
    type Err = AccountValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(AccountValidationError::UnknownRole),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Trimmed, lower-cased email address used as the login handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new("  Ada@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_str(), "ada@example.com");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.chars().count() > EMAIL_MAX {
            return Err(AccountValidationError::EmailTooLong);
        }
        if !email_regex().is_match(&normalised) {
            return Err(AccountValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First or last name of an account holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    /// Validate a name for the given request field.
    pub fn new(raw: impl AsRef<str>, field: &'static str) -> Result<Self, AccountValidationError> {
        let trimmed = raw.as_ref().trim();
        let len = trimmed.chars().count();
        if !(NAME_MIN..=NAME_MAX).contains(&len) {
            return Err(AccountValidationError::NameLength { field });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn weakness(value: &str) -> Option<&'static str> {
    let len = value.chars().count();
    if len < PASSWORD_MIN {
        return Some("must be at least 8 characters");
    }
    if len > PASSWORD_MAX {
        return Some("must be at most 128 characters");
    }
    if !value.chars().any(char::is_uppercase) {
        return Some("must contain an upper-case letter");
    }
    if !value.chars().any(char::is_lowercase) {
        return Some("must contain a lower-case letter");
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Some("must contain a digit");
    }
    if !value.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        return Some("must contain a symbol");
    }
    None
}

/// Plaintext password that satisfied the strength policy.
///
/// The buffer is zeroed on drop.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Check length and character classes.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::Password;
    ///
    /// assert!(Password::new("Str0ng!pass").is_ok());
    /// assert!(Password::new("weakpass").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, AccountValidationError> {
        let value = Zeroizing::new(raw.into());
        match weakness(&value) {
            Some(reason) => Err(AccountValidationError::WeakPassword { reason }),
            None => Ok(Self(value)),
        }
    }

    /// Borrow the plaintext for hashing.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(**redacted**)")
    }
}

/// PHC-formatted password hash as stored.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash string produced by a [`crate::domain::ports::PasswordHasher`].
    pub fn from_phc(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the PHC string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Login input. Password strength is not re-checked here.
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Capture raw credentials from a login form.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Raw email as typed.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Plaintext password.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Persisted account.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub image: Option<ImageUrl>,
    pub role: Role,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a new account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub image: Option<ImageUrl>,
    pub role: Role,
}

/// Partial account update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub email: Option<EmailAddress>,
    pub password_hash: Option<PasswordHash>,
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub image: Option<ImageUrl>,
    pub role: Option<Role>,
    pub blocked: Option<bool>,
}

impl AccountChanges {
    /// True when no column would change.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.image.is_none()
            && self.role.is_none()
            && self.blocked.is_none()
    }
}
