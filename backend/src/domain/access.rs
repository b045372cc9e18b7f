//! Access policy for catalogue operations.
//!
//! [`decide`] is a pure function of the operation, the resolved caller, and the
//! current holder of the resource. It is the single place role checks live for
//! both catalogue kinds; handlers and services never compare roles directly.
//!
//! Rules, first match wins:
//!
//! 1. Anonymous callers may read store items and nothing else.
//! 2. Store items: any authenticated caller may read or acquire them; only
//!    managers and admins create, update, or delete them.
//! 3. Items owned by the caller: read, update, and delete are allowed.
//! 4. Items owned by someone else: managers and admins only.
//!
//! Creation always requires a manager or admin, and acquisition only ever
//! applies to store items.

use serde_json::json;

use super::{AccountId, Error, Owner, Role};

/// Operations the policy distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadOne,
    ReadMany,
    Create,
    Update,
    Delete,
    Transfer,
}

/// An authenticated, unblocked account as resolved for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: AccountId,
    pub role: Role,
}

/// The party performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Principal(Principal),
}

impl Caller {
    /// Shorthand for an authenticated caller.
    pub fn principal(id: AccountId, role: Role) -> Self {
        Self::Principal(Principal { id, role })
    }

    /// The principal, or `Unauthenticated`.
    pub fn require_principal(&self) -> Result<Principal, DenyReason> {
        match self {
            Self::Anonymous => Err(DenyReason::Unauthenticated),
            Self::Principal(principal) => Ok(*principal),
        }
    }

    /// The principal when it holds `role`.
    pub fn require_role(&self, role: Role) -> Result<Principal, DenyReason> {
        let principal = self.require_principal()?;
        if principal.role == role {
            Ok(principal)
        } else {
            Err(DenyReason::Forbidden)
        }
    }

    fn is_privileged(&self) -> bool {
        matches!(self, Self::Principal(p) if p.role.is_privileged())
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    /// No credential, or the caller must log in first.
    #[error("authentication required")]
    Unauthenticated,
    /// Authenticated but not permitted.
    #[error("insufficient permissions")]
    Forbidden,
}

impl From<DenyReason> for Error {
    fn from(value: DenyReason) -> Self {
        match value {
            DenyReason::Unauthenticated => Error::unauthorized(value.to_string()),
            DenyReason::Forbidden => Error::forbidden(value.to_string()),
        }
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    /// `Ok(())` when allowed.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }

    /// True when allowed.
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

fn privileged_only(caller: &Caller) -> Decision {
    if caller.is_privileged() {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::Forbidden)
    }
}

/// Decide whether `caller` may perform `operation` on a resource held by
/// `owner`.
///
/// # Examples
/// ```
/// use storefront::domain::{decide, AccountId, Caller, Decision, DenyReason, Operation, Owner};
///
/// let owner = Owner::Account(AccountId::new(42).expect("valid id"));
/// assert_eq!(decide(Operation::ReadOne, &Caller::Anonymous, Owner::Store), Decision::Allow);
/// assert_eq!(
///     decide(Operation::ReadOne, &Caller::Anonymous, owner),
///     Decision::Deny(DenyReason::Unauthenticated),
/// );
/// ```
pub fn decide(operation: Operation, caller: &Caller, owner: Owner) -> Decision {
    let Caller::Principal(principal) = caller else {
        return match (operation, owner) {
            (Operation::ReadOne | Operation::ReadMany, Owner::Store) => Decision::Allow,
            _ => Decision::Deny(DenyReason::Unauthenticated),
        };
    };

    match (owner, operation) {
        (_, Operation::Create) => privileged_only(caller),
        (Owner::Store, Operation::ReadOne | Operation::ReadMany | Operation::Transfer) => {
            Decision::Allow
        }
        (Owner::Store, Operation::Update | Operation::Delete) => privileged_only(caller),
        (Owner::Account(_), Operation::Transfer) => Decision::Deny(DenyReason::Forbidden),
        (Owner::Account(id), _) if id == principal.id => Decision::Allow,
        (Owner::Account(_), _) => privileged_only(caller),
    }
}

/// Owner filter requested by a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerFilter {
    /// No filter: whatever the caller may see.
    Unfiltered,
    /// The caller's own items.
    Me,
    /// Store inventory only.
    Store,
    /// Items held by a specific account.
    Account(AccountId),
}

impl OwnerFilter {
    /// Parse the `owner` query value: `me`, `store`, or an account id.
    pub fn parse(raw: Option<&str>) -> Result<Self, Error> {
        let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(Self::Unfiltered);
        };
        match value {
            "me" => Ok(Self::Me),
            "store" => Ok(Self::Store),
            other => other
                .parse::<i64>()
                .ok()
                .and_then(|id| AccountId::new(id).ok())
                .map(Self::Account)
                .ok_or_else(|| {
                    Error::invalid_request("owner must be me, store, or an account id")
                        .with_details(json!({ "field": "owner", "code": "invalid_value" }))
                }),
        }
    }
}

/// Rows a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Every row.
    All,
    /// Store rows only.
    Store,
    /// Store rows plus rows owned by the account.
    StoreAndAccount(AccountId),
    /// Rows owned by the account.
    Account(AccountId),
}

/// Resolve which rows `caller` sees for `filter`.
pub fn list_scope(caller: &Caller, filter: OwnerFilter) -> Result<ListScope, DenyReason> {
    match (caller, filter) {
        (_, OwnerFilter::Store) => Ok(ListScope::Store),
        (Caller::Anonymous, OwnerFilter::Unfiltered) => Ok(ListScope::Store),
        (Caller::Principal(p), OwnerFilter::Unfiltered) if p.role.is_privileged() => {
            Ok(ListScope::All)
        }
        (Caller::Principal(p), OwnerFilter::Unfiltered) => Ok(ListScope::StoreAndAccount(p.id)),
        (Caller::Anonymous, OwnerFilter::Me) => Err(DenyReason::Unauthenticated),
        (Caller::Principal(p), OwnerFilter::Me) => Ok(ListScope::Account(p.id)),
        (_, OwnerFilter::Account(id)) => decide(Operation::ReadMany, caller, Owner::Account(id))
            .into_result()
            .map(|()| ListScope::Account(id)),
    }
}
