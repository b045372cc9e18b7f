//! Builders for HTTP state ports.
//!
//! PostgreSQL adapters back the state when a database URL is configured;
//! otherwise the in-memory stores are used.

use std::sync::Arc;

use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{info, warn};

use storefront::domain::ports::{AccountRepository, ItemRepository};
use storefront::domain::{Account, EmailAddress, Password};
use storefront::inbound::http::state::{HttpState, HttpStateOptions, HttpStatePorts};
use storefront::outbound::memory::{MemoryAccountRepository, MemoryItemRepository};
use storefront::outbound::persistence::{
    DbPool, DieselAccountRepository, DieselItemRepository, PoolConfig, migrate,
};
use storefront::outbound::security::{Argon2PasswordHasher, JwtCredentialIssuer};

use super::settings::{AdminBootstrap, ServerSettings};

const EPHEMERAL_SECRET_BYTES: usize = 32;

type StorePorts = (Arc<dyn ItemRepository>, Arc<dyn AccountRepository>);

/// Resolve the token signing secret.
///
/// Without a configured secret a random one is generated when
/// `allow_ephemeral` holds; tokens then die with the process.
pub(crate) fn resolve_jwt_secret(
    configured: Option<&str>,
    allow_ephemeral: bool,
) -> std::io::Result<Vec<u8>> {
    match configured {
        Some(secret) if secret.trim().is_empty() => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "jwt secret must not be blank",
        )),
        Some(secret) => Ok(secret.as_bytes().to_vec()),
        None if allow_ephemeral => {
            warn!("using ephemeral jwt secret (dev only)");
            let mut bytes = [0_u8; EPHEMERAL_SECRET_BYTES];
            OsRng.fill_bytes(&mut bytes);
            Ok(hex::encode(bytes).into_bytes())
        }
        None => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "STOREFRONT_JWT_SECRET must be set in release builds",
        )),
    }
}

async fn build_store_ports(settings: &ServerSettings) -> std::io::Result<StorePorts> {
    let Some(url) = settings.database_url() else {
        info!("no database configured; using in-memory stores");
        return Ok((
            Arc::new(MemoryItemRepository::new()),
            Arc::new(MemoryAccountRepository::new()),
        ));
    };

    let applied = migrate(url.to_owned())
        .await
        .map_err(|err| std::io::Error::other(format!("database migration failed: {err}")))?;
    info!(applied, "database migrations applied");

    let pool = DbPool::new(
        PoolConfig::new(url).with_max_size(settings.database_max_connections()),
    )
    .await
    .map_err(|err| std::io::Error::other(format!("database pool setup failed: {err}")))?;

    Ok((
        Arc::new(DieselItemRepository::new(pool.clone())),
        Arc::new(DieselAccountRepository::new(pool)),
    ))
}

/// Build the handler state from settings.
///
/// # Errors
/// Returns [`std::io::Error`] when the secret is missing or the database
/// cannot be migrated or pooled.
pub(crate) async fn build_http_state(settings: &ServerSettings) -> std::io::Result<HttpState> {
    let secret = resolve_jwt_secret(settings.jwt_secret.as_deref(), cfg!(debug_assertions))?;
    let (items, accounts) = build_store_ports(settings).await?;
    let ports = HttpStatePorts {
        items,
        accounts,
        issuer: Arc::new(JwtCredentialIssuer::new(&secret)),
        hasher: Arc::new(Argon2PasswordHasher::new()),
    };
    let options = HttpStateOptions {
        tokens: settings.token_policy(),
        retry: settings.retry_policy(),
    };
    Ok(HttpState::new(ports, options))
}

/// Ensure the configured administrator exists, is unblocked, and holds the
/// admin role.
pub(crate) async fn bootstrap_admin(
    state: &HttpState,
    admin: &AdminBootstrap,
) -> std::io::Result<Account> {
    let invalid = |err: &dyn std::fmt::Display| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid bootstrap admin: {err}"),
        )
    };
    let email = EmailAddress::new(&admin.email).map_err(|err| invalid(&err))?;
    let password = Password::new(admin.password.clone()).map_err(|err| invalid(&err))?;
    let account = state
        .accounts
        .ensure_admin(email, password)
        .await
        .map_err(|err| std::io::Error::other(format!("admin bootstrap failed: {err}")))?;
    info!(target: "audit", account_id = %account.id, "bootstrap administrator ensured");
    Ok(account)
}
