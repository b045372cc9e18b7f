//! Pieces shared by the pet and product handlers.
//!
//! Both catalogue kinds expose the same route shapes; the handlers differ only
//! in their request bodies and response DTOs.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{CatalogItem, Error, ItemKind, Owner, OwnerFilter};

use super::auth::CallerContext;
use super::dto::collect_items;
use super::state::HttpState;
use super::validation::{parse_item_id, parse_owner};

/// Listing filter.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnerQuery {
    /// `me`, `store`, or an account id. Omitted means everything visible.
    #[param(example = "store")]
    pub owner: Option<String>,
}

/// Rows of `kind` visible to the caller under the query's owner filter.
pub(crate) async fn list_kind<T>(
    state: &HttpState,
    caller: &CallerContext,
    kind: ItemKind,
    query: &OwnerQuery,
) -> Result<Vec<T>, Error>
where
    T: TryFrom<CatalogItem, Error = Error>,
{
    let filter = OwnerFilter::parse(query.owner.as_deref())?;
    let items = state.catalog.list(caller.caller(), kind, filter).await?;
    collect_items(items)
}

/// The caller's own rows of `kind`.
pub(crate) async fn list_own_kind<T>(
    state: &HttpState,
    caller: &CallerContext,
    kind: ItemKind,
) -> Result<Vec<T>, Error>
where
    T: TryFrom<CatalogItem, Error = Error>,
{
    let items = state.catalog.list_own(caller.caller(), kind).await?;
    collect_items(items)
}

/// One row by path id.
pub(crate) async fn get_kind<T>(
    state: &HttpState,
    caller: &CallerContext,
    kind: ItemKind,
    raw_id: i64,
) -> Result<T, Error>
where
    T: TryFrom<CatalogItem, Error = Error>,
{
    let id = parse_item_id(raw_id)?;
    T::try_from(state.catalog.get(caller.caller(), kind, id).await?)
}

/// Delete one row by path id.
pub(crate) async fn delete_kind(
    state: &HttpState,
    caller: &CallerContext,
    kind: ItemKind,
    raw_id: i64,
) -> Result<(), Error> {
    let id = parse_item_id(raw_id)?;
    state.catalog.delete(caller.caller(), kind, id).await
}

/// Acquire a store row by path id.
pub(crate) async fn buy_kind<T>(
    state: &HttpState,
    caller: &CallerContext,
    kind: ItemKind,
    raw_id: i64,
) -> Result<T, Error>
where
    T: TryFrom<CatalogItem, Error = Error>,
{
    let id = parse_item_id(raw_id)?;
    T::try_from(state.catalog.buy(caller.caller(), kind, id).await?)
}

/// Requested holder for a new row; absent means the store.
pub(crate) fn requested_owner(raw: Option<i64>) -> Result<Owner, Error> {
    Ok(raw.map(parse_owner).transpose()?.unwrap_or(Owner::Store))
}

/// Requested holder change for an update.
pub(crate) fn owner_change(raw: Option<i64>) -> Result<Option<Owner>, Error> {
    raw.map(parse_owner).transpose()
}
