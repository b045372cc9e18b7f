//! Edge middleware: security headers, CORS, and per-client rate limiting.
//!
//! The server builds these once from settings; the rate limiter's state is
//! shared by every worker so the quota applies per peer address, not per
//! worker thread.

use std::time::Duration;

use actix_cors::Cors;
use actix_governor::{GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor};
use actix_web::http::header::{self, HeaderName};
use actix_web::middleware::DefaultHeaders;
use governor::middleware::NoOpMiddleware;
use url::Url;

use crate::domain::TRACE_ID_HEADER;

/// Limiter state keyed by peer IP.
pub type PeerRateLimitConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

const CORS_MAX_AGE_SECS: usize = 12 * 60 * 60;

/// Invalid edge middleware settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeConfigError {
    #[error("invalid CORS origin {origin:?}: expected scheme://host[:port]")]
    InvalidOrigin { origin: String },
    #[error("rate limit burst and period must be positive")]
    InvalidRateLimit,
}

/// Headers added to every response that does not already carry them.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "DENY"))
        .add((header::REFERRER_POLICY, "no-referrer"))
        .add((
            header::STRICT_TRANSPORT_SECURITY,
            "max-age=63072000; includeSubDomains",
        ))
        .add((
            header::CONTENT_SECURITY_POLICY,
            "default-src 'self'; frame-ancestors 'none'",
        ))
}

/// Browser origins allowed to call the API with credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsPolicy {
    origins: Vec<String>,
}

impl CorsPolicy {
    /// Parse a comma-separated origin list. Blank entries are ignored.
    ///
    /// # Examples
    /// ```
    /// use storefront::middleware::CorsPolicy;
    ///
    /// let policy = CorsPolicy::parse("http://localhost:3000, https://shop.example.com")
    ///     .expect("valid origins");
    /// assert_eq!(policy.origins().len(), 2);
    /// assert!(CorsPolicy::parse("*").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, EdgeConfigError> {
        let origins = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(parse_origin)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { origins })
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    /// Build the CORS middleware. Cross-origin requests from unlisted
    /// origins are refused; same-origin requests pass untouched.
    pub fn middleware(&self) -> Cors {
        let base = Cors::default()
            .allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ORIGIN])
            .expose_headers([header::CONTENT_LENGTH, HeaderName::from_static(TRACE_ID_HEADER)])
            .supports_credentials()
            .max_age(CORS_MAX_AGE_SECS);
        self.origins
            .iter()
            .fold(base, |cors, origin| cors.allowed_origin(origin))
    }
}

fn parse_origin(raw: &str) -> Result<String, EdgeConfigError> {
    let invalid = || EdgeConfigError::InvalidOrigin {
        origin: raw.to_owned(),
    };
    let url = Url::parse(raw).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    let origin = url.origin().ascii_serialization();
    if origin != raw.trim_end_matches('/') {
        return Err(invalid());
    }
    Ok(origin)
}

/// Token bucket applied per client address: `burst` requests, one of which
/// is replenished every `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    burst: u32,
    period: Duration,
}

impl RateLimit {
    /// `None` when either bound is zero, which disables limiting.
    pub fn new(burst: u32, period: Duration) -> Option<Self> {
        (burst > 0 && period.as_secs() > 0).then_some(Self { burst, period })
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Build the shared limiter state.
    pub fn config(&self) -> Result<PeerRateLimitConfig, EdgeConfigError> {
        GovernorConfigBuilder::default()
            .seconds_per_request(self.period.as_secs())
            .burst_size(self.burst)
            .finish()
            .ok_or(EdgeConfigError::InvalidRateLimit)
    }
}
