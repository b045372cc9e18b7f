//! Storefront marketplace backend.
//!
//! Hexagonal layout: [`domain`] holds the policy, the ownership transfer
//! engine and the services; [`inbound`] adapts HTTP onto them; [`outbound`]
//! provides PostgreSQL, in-memory, and credential adapters for the driven
//! ports.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
