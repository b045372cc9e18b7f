//! Account lifecycle: registration, login, profile edits, and administration.
//!
//! Password hashing runs on the blocking pool. Security-relevant events are
//! emitted on the `audit` tracing target.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::ports::{
    AccountRepository, CredentialIssuer, IssuedToken, PasswordHasher, PasswordHasherError,
};
use super::{
    Account, AccountChanges, AccountId, Caller, EmailAddress, Error, ImageUrl, LoginCredentials,
    NewAccount, Password, PasswordHash, PersonName, Role,
};

const INVALID_LOGIN: &str = "invalid email or password";

/// Token lifetimes for freshly authenticated and refreshed sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    pub login_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            login_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(900),
        }
    }
}

/// Validated registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: EmailAddress,
    pub password: Password,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub image: Option<ImageUrl>,
}

/// Self-service profile edit. Role and block state are never editable here.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<EmailAddress>,
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub image: Option<ImageUrl>,
}

impl From<ProfileChanges> for AccountChanges {
    fn from(value: ProfileChanges) -> Self {
        Self {
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            image: value.image,
            ..Self::default()
        }
    }
}

/// An account together with a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub token: IssuedToken,
}

/// Identity operations over the account store.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<dyn CredentialIssuer>,
    tokens: TokenPolicy,
}

impl AccountService {
    /// Build the service from its driven ports.
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<dyn CredentialIssuer>,
        tokens: TokenPolicy,
    ) -> Self {
        Self {
            accounts,
            hasher,
            issuer,
            tokens,
        }
    }

    /// Create a `user` account and sign it in.
    pub async fn register(&self, registration: Registration) -> Result<Session, Error> {
        let password_hash = self.hash(registration.password).await?;
        let account = self
            .accounts
            .create(NewAccount {
                email: registration.email,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                image: registration.image,
                role: Role::User,
            })
            .await?;
        info!(target: "audit", account_id = %account.id, "account registered");
        self.open_session(account)
    }

    /// Exchange credentials for a session.
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn login(&self, credentials: LoginCredentials) -> Result<Session, Error> {
        let Ok(email) = EmailAddress::new(credentials.email()) else {
            return Err(Error::unauthorized(INVALID_LOGIN));
        };
        let Some(account) = self.accounts.find_by_email(&email).await? else {
            self.verify_decoy(credentials.password()).await?;
            warn!(target: "audit", "login rejected: unknown email");
            return Err(Error::unauthorized(INVALID_LOGIN));
        };
        if !self
            .verify(credentials.password(), account.password_hash.clone())
            .await?
        {
            warn!(target: "audit", account_id = %account.id, "login rejected: wrong password");
            return Err(Error::unauthorized(INVALID_LOGIN));
        }
        if account.blocked {
            warn!(target: "audit", account_id = %account.id, "login rejected: account blocked");
            return Err(Error::forbidden("account is blocked"));
        }
        info!(target: "audit", account_id = %account.id, "login succeeded");
        self.open_session(account)
    }

    /// Issue a short-lived token carrying the caller's stored role.
    pub fn refresh(&self, caller: &Caller) -> Result<IssuedToken, Error> {
        let principal = caller.require_principal()?;
        Ok(self
            .issuer
            .issue(principal.id, principal.role, self.tokens.refresh_ttl)?)
    }

    /// The caller's own account.
    pub async fn profile(&self, caller: &Caller) -> Result<Account, Error> {
        let principal = caller.require_principal()?;
        self.load(principal.id).await
    }

    /// Edit the caller's own name, email, or image.
    pub async fn update_profile(
        &self,
        caller: &Caller,
        changes: ProfileChanges,
    ) -> Result<Account, Error> {
        let principal = caller.require_principal()?;
        let changes = AccountChanges::from(changes);
        if changes.is_empty() {
            return Err(Error::invalid_request("no changes supplied"));
        }
        self.accounts
            .update(principal.id, changes)
            .await?
            .ok_or_else(|| account_not_found(principal.id))
    }

    /// Every account; admin only.
    pub async fn list_accounts(&self, caller: &Caller) -> Result<Vec<Account>, Error> {
        caller.require_role(Role::Admin)?;
        Ok(self.accounts.list().await?)
    }

    /// One account; admin only.
    pub async fn account(&self, caller: &Caller, id: AccountId) -> Result<Account, Error> {
        caller.require_role(Role::Admin)?;
        self.load(id).await
    }

    /// Block or unblock an account; admin only. Admins cannot block
    /// themselves.
    pub async fn set_blocked(
        &self,
        caller: &Caller,
        id: AccountId,
        blocked: bool,
    ) -> Result<Account, Error> {
        let admin = caller.require_role(Role::Admin)?;
        if blocked && admin.id == id {
            return Err(Error::invalid_request("administrators cannot block themselves"));
        }
        let account = self
            .apply_admin_change(
                id,
                AccountChanges {
                    blocked: Some(blocked),
                    ..AccountChanges::default()
                },
            )
            .await?;
        let event = if blocked { "account blocked" } else { "account unblocked" };
        info!(target: "audit", account_id = %id, actor = %admin.id, "{event}");
        Ok(account)
    }

    /// Change an account's role; admin only. Admins cannot demote
    /// themselves.
    pub async fn change_role(
        &self,
        caller: &Caller,
        id: AccountId,
        role: Role,
    ) -> Result<Account, Error> {
        let admin = caller.require_role(Role::Admin)?;
        if admin.id == id && role != Role::Admin {
            return Err(Error::invalid_request("administrators cannot demote themselves"));
        }
        let account = self
            .apply_admin_change(
                id,
                AccountChanges {
                    role: Some(role),
                    ..AccountChanges::default()
                },
            )
            .await?;
        info!(target: "audit", account_id = %id, actor = %admin.id, %role, "account role changed");
        Ok(account)
    }

    /// Make sure an administrator with `email` exists.
    ///
    /// An existing account is promoted and unblocked; its password is left
    /// alone. Otherwise a new admin account is created.
    pub async fn ensure_admin(
        &self,
        email: EmailAddress,
        password: Password,
    ) -> Result<Account, Error> {
        if let Some(existing) = self.accounts.find_by_email(&email).await? {
            if existing.role == Role::Admin && !existing.blocked {
                return Ok(existing);
            }
            let promoted = self
                .apply_admin_change(
                    existing.id,
                    AccountChanges {
                        role: Some(Role::Admin),
                        blocked: Some(false),
                        ..AccountChanges::default()
                    },
                )
                .await?;
            info!(target: "audit", account_id = %promoted.id, "bootstrap administrator promoted");
            return Ok(promoted);
        }

        let password_hash = self.hash(password).await?;
        let created = self
            .accounts
            .create(NewAccount {
                email,
                password_hash,
                first_name: PersonName::new("Store", "firstName")?,
                last_name: PersonName::new("Admin", "lastName")?,
                image: None,
                role: Role::Admin,
            })
            .await?;
        info!(target: "audit", account_id = %created.id, "bootstrap administrator created");
        Ok(created)
    }

    fn open_session(&self, account: Account) -> Result<Session, Error> {
        let token = self
            .issuer
            .issue(account.id, account.role, self.tokens.login_ttl)?;
        Ok(Session { account, token })
    }

    async fn load(&self, id: AccountId) -> Result<Account, Error> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| account_not_found(id))
    }

    async fn apply_admin_change(
        &self,
        id: AccountId,
        changes: AccountChanges,
    ) -> Result<Account, Error> {
        self.accounts
            .update(id, changes)
            .await?
            .ok_or_else(|| account_not_found(id))
    }

    async fn hash(&self, password: Password) -> Result<PasswordHash, Error> {
        let hasher = Arc::clone(&self.hasher);
        let outcome = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?;
        Ok(outcome?)
    }

    async fn verify(&self, attempt: &str, hash: PasswordHash) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let attempt = zeroize::Zeroizing::new(attempt.to_owned());
        let outcome = tokio::task::spawn_blocking(move || hasher.verify(&attempt, &hash))
            .await
            .map_err(|err| Error::internal(format!("password check task failed: {err}")))?;
        match outcome {
            Ok(matches) => Ok(matches),
            Err(PasswordHasherError::MalformedHash) => {
                warn!("stored password hash is malformed; treating as mismatch");
                Ok(false)
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Pay for one password check against the hasher's decoy.
    async fn verify_decoy(&self, attempt: &str) -> Result<(), Error> {
        let hasher = Arc::clone(&self.hasher);
        let attempt = zeroize::Zeroizing::new(attempt.to_owned());
        let outcome = tokio::task::spawn_blocking(move || {
            let decoy = hasher.decoy_hash()?;
            hasher.verify(&attempt, &decoy)
        })
        .await
        .map_err(|err| Error::internal(format!("password check task failed: {err}")))?;
        outcome.map(drop).map_err(Error::from)
    }
}

fn account_not_found(id: AccountId) -> Error {
    Error::not_found(format!("account {id} not found"))
}
