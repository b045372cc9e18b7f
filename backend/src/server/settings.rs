//! Server settings loaded via OrthoConfig.
//!
//! Values layer from CLI flags, `STOREFRONT_*` environment variables, and
//! configuration files. Every key is optional; accessors apply defaults.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use storefront::domain::{RetryPolicy, TokenPolicy};
use storefront::middleware::{CorsPolicy, RateLimit};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
const DEFAULT_REFRESH_TTL_SECS: u64 = 900;
const DEFAULT_TRANSFER_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_TRANSFER_BACKOFF_MS: u64 = 25;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_RATE_LIMIT_BURST: u32 = 80;
const DEFAULT_RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Configuration values for the HTTP server and its adapters.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct ServerSettings {
    /// Listen address, `host:port`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. In-memory stores are used when unset.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub database_max_connections: Option<u32>,
    /// HMAC secret for bearer tokens. Required in release builds.
    pub jwt_secret: Option<String>,
    /// Lifetime of tokens issued at login and registration.
    pub token_ttl_secs: Option<u64>,
    /// Lifetime of tokens issued by `/refresh`.
    pub refresh_ttl_secs: Option<u64>,
    /// Attempts the transfer engine makes under contention.
    pub transfer_max_attempts: Option<u32>,
    /// Back-off between transfer attempts.
    pub transfer_backoff_ms: Option<u64>,
    /// Administrator ensured at startup.
    pub admin_email: Option<String>,
    /// Password for a newly created bootstrap administrator.
    pub admin_password: Option<String>,
    /// Comma-separated browser origins allowed to call the API.
    pub cors_origins: Option<String>,
    /// Requests a client may burst against `/api/v1`; `0` disables limiting.
    pub rate_limit_burst: Option<u32>,
    /// Seconds for one request of the burst to be replenished.
    pub rate_limit_period_secs: Option<u64>,
}

impl std::fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("transfer_max_attempts", &self.transfer_max_attempts)
            .field("transfer_backoff_ms", &self.transfer_backoff_ms)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .field("rate_limit_period_secs", &self.rate_limit_period_secs)
            .finish()
    }
}

/// Bootstrap administrator credentials.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl ServerSettings {
    /// Parsed listen address.
    pub fn bind_addr(&self) -> std::io::Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address {raw:?}: {err}"),
            )
        })
    }

    /// Database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn database_max_connections(&self) -> u32 {
        self.database_max_connections
            .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS)
    }

    /// Token lifetimes.
    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy {
            login_ttl: Duration::from_secs(self.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS)),
            refresh_ttl: Duration::from_secs(
                self.refresh_ttl_secs.unwrap_or(DEFAULT_REFRESH_TTL_SECS),
            ),
        }
    }

    /// Transfer engine retry bounds.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.transfer_max_attempts
                .unwrap_or(DEFAULT_TRANSFER_MAX_ATTEMPTS),
            Duration::from_millis(
                self.transfer_backoff_ms
                    .unwrap_or(DEFAULT_TRANSFER_BACKOFF_MS),
            ),
        )
    }

    /// Allowed CORS origins.
    pub fn cors_policy(&self) -> std::io::Result<CorsPolicy> {
        let raw = self.cors_origins.as_deref().unwrap_or(DEFAULT_CORS_ORIGINS);
        CorsPolicy::parse(raw)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))
    }

    /// Per-client request quota, or `None` when limiting is disabled.
    pub fn rate_limit(&self) -> Option<RateLimit> {
        RateLimit::new(
            self.rate_limit_burst.unwrap_or(DEFAULT_RATE_LIMIT_BURST),
            Duration::from_secs(
                self.rate_limit_period_secs
                    .unwrap_or(DEFAULT_RATE_LIMIT_PERIOD_SECS),
            ),
        )
    }

    /// Bootstrap administrator, when both email and password are set.
    pub fn admin_bootstrap(&self) -> Option<AdminBootstrap> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) if !email.trim().is_empty() => Some(AdminBootstrap {
                email: email.to_owned(),
                password: password.to_owned(),
            }),
            _ => None,
        }
    }
}
