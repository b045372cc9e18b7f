//! Catalogue items: pets (non-divisible) and products (stocked).
//!
//! Every item is either held by the shared store inventory or owned by one
//! account. Products owned by an account always carry exactly one unit; only
//! store rows hold sellable stock.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{AccountId, Error, ImageUrl, ImageUrlError};

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;
const LABEL_MIN: usize = 2;
const LABEL_MAX: usize = 50;
const PET_AGE_MAX: u8 = 30;

/// Validation failures for catalogue input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogValidationError {
    /// Identifiers are positive integers.
    #[error("item id must be a positive integer")]
    InvalidId,
    /// Name empty or too long.
    #[error("name must be between 1 and {NAME_MAX} characters")]
    NameLength,
    /// Description too long.
    #[error("description must be at most {DESCRIPTION_MAX} characters")]
    DescriptionLength,
    /// Short label (breed, category, brand) out of bounds.
    #[error("{field} must be between {LABEL_MIN} and {LABEL_MAX} characters")]
    LabelLength {
        /// Offending field.
        field: &'static str,
    },
    /// Price not strictly positive.
    #[error("price must be a positive amount")]
    InvalidPrice,
    /// Age outside 0..=30.
    #[error("age must be between 0 and {PET_AGE_MAX}")]
    InvalidAge,
    /// Gender outside the closed set.
    #[error("gender must be male or female")]
    InvalidGender,
    /// Mass negative or not finite.
    #[error("mass must not be negative")]
    InvalidMass,
    /// Stock negative or too large.
    #[error("stock must be a non-negative integer")]
    InvalidStock,
    /// Owned product with stock other than one.
    #[error("an owned product must have a stock of exactly 1")]
    OwnedStock,
    /// Image URL rejected.
    #[error("{0}")]
    Image(#[from] ImageUrlError),
}

impl CatalogValidationError {
    /// Request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::NameLength => "name",
            Self::DescriptionLength => "description",
            Self::LabelLength { field } => *field,
            Self::InvalidPrice => "price",
            Self::InvalidAge => "age",
            Self::InvalidGender => "gender",
            Self::InvalidMass => "mass",
            Self::InvalidStock | Self::OwnedStock => "stock",
            Self::Image(_) => "image",
        }
    }

    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
            Self::NameLength | Self::DescriptionLength | Self::LabelLength { .. } => {
                "invalid_length"
            }
            Self::InvalidPrice
            | Self::InvalidAge
            | Self::InvalidMass
            | Self::InvalidStock => "out_of_range",
            Self::InvalidGender => "invalid_value",
            Self::OwnedStock => "owned_stock",
            Self::Image(_) => "invalid_url",
        }
    }
}

impl From<CatalogValidationError> for Error {
    fn from(value: CatalogValidationError) -> Self {
        Error::invalid_request(value.to_string())
            .with_details(json!({ "field": value.field(), "code": value.code() }))
    }
}

/// Item identifier, unique per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(i64);

impl ItemId {
    /// Validate a raw identifier.
    pub fn new(raw: i64) -> Result<Self, CatalogValidationError> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(CatalogValidationError::InvalidId)
        }
    }

    /// Raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two catalogue kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Non-divisible; buying moves the row to the buyer.
    Pet,
    /// Divisible; buying splits one unit off the store row.
    Product,
}

impl ItemKind {
    /// Singular noun for messages and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pet => "pet",
            Self::Product => "product",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who holds an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Shared, available store inventory.
    Store,
    /// Owned by one account.
    Account(AccountId),
}

impl Owner {
    /// Decode the nullable owner column.
    pub fn from_column(raw: Option<i64>) -> Result<Self, CatalogValidationError> {
        match raw {
            None => Ok(Self::Store),
            Some(id) => AccountId::new(id)
                .map(Self::Account)
                .map_err(|_| CatalogValidationError::InvalidId),
        }
    }

    /// Encode as the nullable owner column.
    pub fn as_column(self) -> Option<i64> {
        match self {
            Self::Store => None,
            Self::Account(id) => Some(id.get()),
        }
    }

    /// True for the store sentinel.
    pub fn is_store(self) -> bool {
        matches!(self, Self::Store)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => f.write_str("store"),
            Self::Account(id) => write!(f, "account {id}"),
        }
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Item display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemName(String);

impl ItemName {
    /// Validate a trimmed name of 1 to 100 characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CatalogValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() || char_len(trimmed) > NAME_MAX {
            return Err(CatalogValidationError::NameLength);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Free-text description, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Description(String);

impl Description {
    /// Validate a trimmed description of at most 500 characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CatalogValidationError> {
        let trimmed = raw.as_ref().trim();
        if char_len(trimmed) > DESCRIPTION_MAX {
            return Err(CatalogValidationError::DescriptionLength);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the description.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Short label such as a breed, category, or brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(String);

impl Label {
    /// Validate a trimmed label of 2 to 50 characters for `field`.
    pub fn new(raw: impl AsRef<str>, field: &'static str) -> Result<Self, CatalogValidationError> {
        let trimmed = raw.as_ref().trim();
        if !(LABEL_MIN..=LABEL_MAX).contains(&char_len(trimmed)) {
            return Err(CatalogValidationError::LabelLength { field });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the label.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Strictly positive, finite price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price(f64);

impl Price {
    /// Validate a price.
    pub fn new(raw: f64) -> Result<Self, CatalogValidationError> {
        if raw.is_finite() && raw > 0.0 {
            Ok(Self(raw))
        } else {
            Err(CatalogValidationError::InvalidPrice)
        }
    }

    /// Raw amount.
    pub fn get(self) -> f64 {
        self.0
    }
}

/// Pet age in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PetAge(u8);

impl PetAge {
    /// Validate an age between 0 and 30.
    pub fn new(raw: i64) -> Result<Self, CatalogValidationError> {
        u8::try_from(raw)
            .ok()
            .filter(|age| *age <= PET_AGE_MAX)
            .map(Self)
            .ok_or(CatalogValidationError::InvalidAge)
    }

    /// Age in years.
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Pet gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Stable lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = CatalogValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(CatalogValidationError::InvalidGender),
        }
    }
}

/// Product mass; zero when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mass(f64);

impl Mass {
    /// Validate a non-negative, finite mass.
    pub fn new(raw: f64) -> Result<Self, CatalogValidationError> {
        if raw.is_finite() && raw >= 0.0 {
            Ok(Self(raw))
        } else {
            Err(CatalogValidationError::InvalidMass)
        }
    }

    /// Raw mass.
    pub fn get(self) -> f64 {
        self.0
    }
}

/// Units of a product held by one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Stock(u32);

impl Stock {
    /// A single unit, the only valid stock for owned products.
    pub const ONE: Self = Self(1);

    /// Validate a stock count.
    pub fn new(raw: i64) -> Result<Self, CatalogValidationError> {
        i32::try_from(raw)
            .ok()
            .and_then(|value| u32::try_from(value).ok())
            .map(Self)
            .ok_or(CatalogValidationError::InvalidStock)
    }

    /// Raw count.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Count minus `units`, or `None` when that would go negative.
    pub fn checked_take(self, units: u32) -> Option<Self> {
        self.0.checked_sub(units).map(Self)
    }
}

/// Enforce the owned-product stock rule.
pub fn check_product_stock(owner: Owner, stock: Stock) -> Result<(), CatalogValidationError> {
    match owner {
        Owner::Account(_) if stock != Stock::ONE => Err(CatalogValidationError::OwnedStock),
        _ => Ok(()),
    }
}

/// Descriptive pet attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PetDetails {
    pub name: ItemName,
    pub description: Description,
    pub price: Price,
    pub breed: Label,
    pub age: PetAge,
    pub gender: Gender,
    pub sterilized: bool,
    pub image: Option<ImageUrl>,
}

/// Descriptive product attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    pub name: ItemName,
    pub description: Description,
    pub price: Price,
    pub category: Label,
    pub brand: Option<Label>,
    pub image: Option<ImageUrl>,
    pub mass: Mass,
}

/// Persisted pet row.
#[derive(Debug, Clone, PartialEq)]
pub struct Pet {
    pub id: ItemId,
    pub owner: Owner,
    pub details: PetDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted product row.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ItemId,
    pub owner: Owner,
    pub stock: Stock,
    pub details: ProductDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Either catalogue kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogItem {
    Pet(Pet),
    Product(Product),
}

impl CatalogItem {
    /// Row identifier.
    pub fn id(&self) -> ItemId {
        match self {
            Self::Pet(pet) => pet.id,
            Self::Product(product) => product.id,
        }
    }

    /// Row kind.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Pet(_) => ItemKind::Pet,
            Self::Product(_) => ItemKind::Product,
        }
    }

    /// Current holder.
    pub fn owner(&self) -> Owner {
        match self {
            Self::Pet(pet) => pet.owner,
            Self::Product(product) => product.owner,
        }
    }

    /// Units held; pets are always a single instance.
    pub fn stock(&self) -> Stock {
        match self {
            Self::Pet(_) => Stock::ONE,
            Self::Product(product) => product.stock,
        }
    }
}

/// Values for a new catalogue row.
#[derive(Debug, Clone, PartialEq)]
pub enum NewItem {
    Pet {
        owner: Owner,
        details: PetDetails,
    },
    Product {
        owner: Owner,
        stock: Stock,
        details: ProductDetails,
    },
}

impl NewItem {
    /// A new pet row.
    pub fn pet(owner: Owner, details: PetDetails) -> Self {
        Self::Pet { owner, details }
    }

    /// A new product row, enforcing the owned-product stock rule.
    pub fn product(
        owner: Owner,
        stock: Stock,
        details: ProductDetails,
    ) -> Result<Self, CatalogValidationError> {
        check_product_stock(owner, stock)?;
        Ok(Self::Product {
            owner,
            stock,
            details,
        })
    }

    /// Kind of the row to insert.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Pet { .. } => ItemKind::Pet,
            Self::Product { .. } => ItemKind::Product,
        }
    }

    /// Requested holder.
    pub fn owner(&self) -> Owner {
        match self {
            Self::Pet { owner, .. } | Self::Product { owner, .. } => *owner,
        }
    }

    /// Replace the holder, keeping the owned-product stock rule.
    pub fn with_owner(self, owner: Owner) -> Result<Self, CatalogValidationError> {
        match self {
            Self::Pet { details, .. } => Ok(Self::pet(owner, details)),
            Self::Product { stock, details, .. } => Self::product(owner, stock, details),
        }
    }
}

/// Partial pet update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetChanges {
    pub name: Option<ItemName>,
    pub description: Option<Description>,
    pub price: Option<Price>,
    pub breed: Option<Label>,
    pub age: Option<PetAge>,
    pub gender: Option<Gender>,
    pub sterilized: Option<bool>,
    pub image: Option<ImageUrl>,
    pub owner: Option<Owner>,
}

/// Partial product update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<ItemName>,
    pub description: Option<Description>,
    pub price: Option<Price>,
    pub category: Option<Label>,
    pub brand: Option<Label>,
    pub image: Option<ImageUrl>,
    pub mass: Option<Mass>,
    pub stock: Option<Stock>,
    pub owner: Option<Owner>,
}

/// Partial update for either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemChanges {
    Pet(PetChanges),
    Product(ProductChanges),
}

impl ItemChanges {
    /// Kind the update applies to.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Pet(_) => ItemKind::Pet,
            Self::Product(_) => ItemKind::Product,
        }
    }

    /// Requested new holder, if any.
    pub fn owner(&self) -> Option<Owner> {
        match self {
            Self::Pet(changes) => changes.owner,
            Self::Product(changes) => changes.owner,
        }
    }

    /// Requested new stock, if any.
    pub fn stock(&self) -> Option<Stock> {
        match self {
            Self::Pet(_) => None,
            Self::Product(changes) => changes.stock,
        }
    }

    /// True when the update reassigns the item or changes its stock.
    pub fn touches_custody(&self) -> bool {
        self.owner().is_some() || self.stock().is_some()
    }

    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Pet(changes) => *changes == PetChanges::default(),
            Self::Product(changes) => *changes == ProductChanges::default(),
        }
    }

    /// Check the owned-product stock rule against the row being updated.
    pub fn check_against(&self, current: &CatalogItem) -> Result<(), CatalogValidationError> {
        match (self, current) {
            (Self::Product(changes), CatalogItem::Product(product)) => check_product_stock(
                changes.owner.unwrap_or(product.owner),
                changes.stock.unwrap_or(product.stock),
            ),
            _ => Ok(()),
        }
    }
}

/// Row counts for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemCounts {
    pub total: u64,
    pub store: u64,
    pub owned: u64,
}
