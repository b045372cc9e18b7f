//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies arrive as plain strings and numbers; these helpers lift them
//! into domain value types and shape failures as `invalid_request` errors with
//! a `{field, code}` details object.

use serde_json::json;

use crate::domain::{
    AccountId, AccountValidationError, CatalogValidationError, Error, ImageUrl, ItemId, Owner,
};

/// Validation error codes produced at the HTTP edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidId,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

/// Catalogue identifier from a path segment.
pub(crate) fn parse_item_id(raw: i64) -> Result<ItemId, Error> {
    ItemId::new(raw).map_err(Error::from)
}

/// Account identifier from a path segment.
pub(crate) fn parse_account_id(raw: i64) -> Result<AccountId, Error> {
    AccountId::new(raw).map_err(Error::from)
}

/// Owner from its wire form: `0` is the store, positive values are accounts.
pub(crate) fn parse_owner(raw: i64) -> Result<Owner, Error> {
    if raw == 0 {
        return Ok(Owner::Store);
    }
    AccountId::new(raw).map(Owner::Account).map_err(|_| {
        field_error(
            FieldName::new("ownerId"),
            ErrorCode::InvalidId,
            "ownerId must be 0 for the store or a positive account id",
        )
    })
}

/// Optional image URL; blank strings mean "no image".
pub(crate) fn parse_item_image(raw: Option<&str>) -> Result<Option<ImageUrl>, Error> {
    non_blank(raw)
        .map(ImageUrl::new)
        .transpose()
        .map_err(|err| Error::from(CatalogValidationError::from(err)))
}

/// Optional account image URL; blank strings mean "no image".
pub(crate) fn parse_account_image(raw: Option<&str>) -> Result<Option<ImageUrl>, Error> {
    non_blank(raw)
        .map(ImageUrl::new)
        .transpose()
        .map_err(|err| Error::from(AccountValidationError::from(err)))
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;
    use serde_json::Value;

    fn detail(error: &Error, key: &str) -> Option<String> {
        error
            .details()
            .and_then(|details| details.get(key))
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    #[rstest]
    #[case(0, true)]
    #[case(12, false)]
    fn owners_decode_from_the_wire(#[case] raw: i64, #[case] store: bool) {
        let owner = parse_owner(raw).expect("valid owner");
        assert_eq!(owner.is_store(), store);
    }

    #[rstest]
    fn negative_owners_are_rejected() {
        let err = parse_owner(-3).expect_err("negative owner");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(detail(&err, "field").as_deref(), Some("ownerId"));
        assert_eq!(detail(&err, "code").as_deref(), Some("invalid_id"));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn blank_images_mean_none(#[case] raw: Option<&str>) {
        assert_eq!(parse_item_image(raw).expect("blank is fine"), None);
    }

    #[rstest]
    fn bad_images_name_the_field() {
        let err = parse_account_image(Some("not a url")).expect_err("malformed");
        assert_eq!(detail(&err, "field").as_deref(), Some("image"));
        assert_eq!(detail(&err, "code").as_deref(), Some("invalid_url"));
    }

    #[rstest]
    fn ids_must_be_positive() {
        assert!(parse_item_id(0).is_err());
        assert!(parse_account_id(-1).is_err());
        assert_eq!(parse_item_id(5).expect("valid").get(), 5);
    }
}
