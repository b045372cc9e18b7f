//! Domain primitives, policy, and services.
//!
//! Purpose: Define strongly typed marketplace entities and the rules that
//! govern them, independent of HTTP and persistence. Adapters reach the core
//! through the services re-exported here and implement the driven ports in
//! [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - decide / list_scope: the access policy for catalogue operations.
//! - OwnershipTransferEngine: atomic store-to-buyer transfers.
//! - CallerGate: bearer credential to caller resolution.
//! - AccountService, CatalogService, StatsService: driving operations.

pub mod access;
pub mod account_service;
pub mod accounts;
pub mod caller_gate;
pub mod catalog;
pub mod catalog_service;
pub mod error;
pub mod media;
mod port_errors;
pub mod ports;
pub mod stats;
#[cfg(test)]
pub(crate) mod test_support;
pub mod trace_id;
pub mod transfer;

pub use self::access::{
    Caller, Decision, DenyReason, ListScope, Operation, OwnerFilter, Principal, decide, list_scope,
};
pub use self::account_service::{
    AccountService, ProfileChanges, Registration, Session, TokenPolicy,
};
pub use self::accounts::{
    Account, AccountChanges, AccountId, AccountValidationError, EmailAddress, LoginCredentials,
    NewAccount, Password, PasswordHash, PersonName, Role,
};
pub use self::caller_gate::CallerGate;
pub use self::catalog::{
    CatalogItem, CatalogValidationError, Description, Gender, ItemChanges, ItemCounts, ItemId,
    ItemKind, ItemName, Label, Mass, NewItem, Owner, Pet, PetAge, PetChanges, PetDetails, Price,
    Product, ProductChanges, ProductDetails, Stock, check_product_stock,
};
pub use self::catalog_service::CatalogService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::media::{ImageUrl, ImageUrlError};
pub use self::stats::{MarketplaceStats, StatsService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::transfer::{OwnershipTransferEngine, RetryPolicy, TransferError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use storefront::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
