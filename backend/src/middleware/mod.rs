//! Request middleware: tracing plus the edge layers applied at the HTTP boundary.

pub mod security;
pub mod trace;

pub use security::{CorsPolicy, EdgeConfigError, PeerRateLimitConfig, RateLimit, security_headers};
pub use trace::Trace;
