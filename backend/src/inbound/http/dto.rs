//! Response bodies shared by the HTTP handlers.
//!
//! Domain types do not derive `Serialize`; these DTOs fix the wire shape
//! (camelCase keys, `ownerId: 0` for store stock) at the edge.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ports::IssuedToken;
use crate::domain::{
    Account, CatalogItem, Error, ItemCounts, MarketplaceStats, Owner, Pet, Product, Session,
};

/// Wire value for an owner; the store is `0`.
pub(crate) fn owner_to_wire(owner: Owner) -> i64 {
    owner.as_column().unwrap_or(0)
}

/// Public view of an account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    pub image: Option<String>,
    #[schema(example = "user")]
    pub role: String,
    pub blocked: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.get(),
            email: account.email.as_str().to_owned(),
            first_name: account.first_name.as_str().to_owned(),
            last_name: account.last_name.as_str().to_owned(),
            image: account.image.map(|image| image.as_str().to_owned()),
            role: account.role.as_str().to_owned(),
            blocked: account.blocked,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// A bearer token and its expiry.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
        }
    }
}

/// Account plus a freshly issued token.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub account: AccountResponse,
    pub token: String,
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            account: session.account.into(),
            token: session.token.token,
            expires_at: session.token.expires_at,
        }
    }
}

/// A pet as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetResponse {
    pub id: i64,
    /// Owning account, or `0` while the store holds the pet.
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub breed: String,
    pub age: u8,
    #[schema(example = "female")]
    pub gender: String,
    pub sterilized: bool,
    pub image: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl From<Pet> for PetResponse {
    fn from(pet: Pet) -> Self {
        let details = pet.details;
        Self {
            id: pet.id.get(),
            owner_id: owner_to_wire(pet.owner),
            name: details.name.as_str().to_owned(),
            description: details.description.as_str().to_owned(),
            price: details.price.get(),
            breed: details.breed.as_str().to_owned(),
            age: details.age.get(),
            gender: details.gender.as_str().to_owned(),
            sterilized: details.sterilized,
            image: details.image.map(|image| image.as_str().to_owned()),
            created_at: pet.created_at,
            updated_at: pet.updated_at,
        }
    }
}

impl TryFrom<CatalogItem> for PetResponse {
    type Error = Error;

    fn try_from(item: CatalogItem) -> Result<Self, Self::Error> {
        match item {
            CatalogItem::Pet(pet) => Ok(pet.into()),
            CatalogItem::Product(product) => Err(Error::internal(format!(
                "expected a pet, store returned product {}",
                product.id
            ))),
        }
    }
}

/// A product as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i64,
    /// Owning account, or `0` for store stock.
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub mass: f64,
    pub stock: u32,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let details = product.details;
        Self {
            id: product.id.get(),
            owner_id: owner_to_wire(product.owner),
            name: details.name.as_str().to_owned(),
            description: details.description.as_str().to_owned(),
            price: details.price.get(),
            category: details.category.as_str().to_owned(),
            brand: details.brand.map(|brand| brand.as_str().to_owned()),
            image: details.image.map(|image| image.as_str().to_owned()),
            mass: details.mass.get(),
            stock: product.stock.get(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl TryFrom<CatalogItem> for ProductResponse {
    type Error = Error;

    fn try_from(item: CatalogItem) -> Result<Self, Self::Error> {
        match item {
            CatalogItem::Product(product) => Ok(product.into()),
            CatalogItem::Pet(pet) => Err(Error::internal(format!(
                "expected a product, store returned pet {}",
                pet.id
            ))),
        }
    }
}

/// Convert a list of catalogue rows into response DTOs.
pub(crate) fn collect_items<T>(items: Vec<CatalogItem>) -> Result<Vec<T>, Error>
where
    T: TryFrom<CatalogItem, Error = Error>,
{
    items.into_iter().map(T::try_from).collect()
}

/// Row counts for one catalogue kind.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemCountsResponse {
    pub total: u64,
    pub store: u64,
    pub owned: u64,
}

impl From<ItemCounts> for ItemCountsResponse {
    fn from(counts: ItemCounts) -> Self {
        Self {
            total: counts.total,
            store: counts.store,
            owned: counts.owned,
        }
    }
}

/// Marketplace-wide statistics.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub accounts: u64,
    pub pets: ItemCountsResponse,
    pub products: ItemCountsResponse,
}

impl From<MarketplaceStats> for StatsResponse {
    fn from(stats: MarketplaceStats) -> Self {
        Self {
            accounts: stats.accounts,
            pets: stats.pets.into(),
            products: stats.products.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{account_id, pet_details, product_details, sample_account};
    use crate::domain::{ItemId, Role, Stock};
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    fn store_pets_serialise_with_owner_zero() {
        let now = Utc::now();
        let pet = Pet {
            id: ItemId::new(3).expect("valid id"),
            owner: Owner::Store,
            details: pet_details("Rex"),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(PetResponse::from(pet)).expect("serialise");
        assert_eq!(json["ownerId"], Value::from(0));
        assert_eq!(json["gender"], Value::from("female"));
        assert!(json.get("createdAt").is_some());
    }

    #[rstest]
    fn owned_products_report_their_owner() {
        let now = Utc::now();
        let product = Product {
            id: ItemId::new(9).expect("valid id"),
            owner: Owner::Account(account_id(4)),
            stock: Stock::ONE,
            details: product_details("Kibble"),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(ProductResponse::from(product)).expect("serialise");
        assert_eq!(json["ownerId"], Value::from(4));
        assert_eq!(json["stock"], Value::from(1));
        assert_eq!(json["brand"], Value::from("Acme"));
    }

    #[rstest]
    fn accounts_never_expose_the_password_hash() {
        let json = serde_json::to_value(AccountResponse::from(sample_account(
            2,
            Role::Manager,
            false,
        )))
        .expect("serialise");
        assert_eq!(json["role"], Value::from("manager"));
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[rstest]
    fn mismatched_kinds_are_internal_errors() {
        let now = Utc::now();
        let pet = CatalogItem::Pet(Pet {
            id: ItemId::new(1).expect("valid id"),
            owner: Owner::Store,
            details: pet_details("Rex"),
            created_at: now,
            updated_at: now,
        });
        let err = ProductResponse::try_from(pet).expect_err("kind mismatch");
        assert_eq!(err.code(), crate::domain::ErrorCode::InternalError);
    }
}
