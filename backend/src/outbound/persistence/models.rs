//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Changesets use `Option` fields so only the
//! columns an update names are written.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{accounts, pets, products};

// ---------------------------------------------------------------------------
// Account models
// ---------------------------------------------------------------------------

/// Row struct for reading from the accounts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub image: Option<String>,
    pub role: String,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for registering accounts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub(crate) struct NewAccountRow<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub image: Option<&'a str>,
    pub role: &'a str,
}

/// Changeset for partial account updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = accounts)]
pub(crate) struct AccountUpdate<'a> {
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub image: Option<&'a str>,
    pub role: Option<&'a str>,
    pub blocked: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Pet models
// ---------------------------------------------------------------------------

/// Row struct for reading from the pets table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PetRow {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub breed: String,
    pub age: i16,
    pub gender: String,
    pub sterilized: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new pets.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pets)]
pub(crate) struct NewPetRow<'a> {
    pub owner_id: Option<i64>,
    pub name: &'a str,
    pub description: &'a str,
    pub price: f64,
    pub breed: &'a str,
    pub age: i16,
    pub gender: &'a str,
    pub sterilized: bool,
    pub image: Option<&'a str>,
}

/// Changeset for partial pet updates. `owner_id: Some(None)` returns the pet
/// to the store.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = pets)]
pub(crate) struct PetUpdate<'a> {
    pub owner_id: Option<Option<i64>>,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<f64>,
    pub breed: Option<&'a str>,
    pub age: Option<i16>,
    pub gender: Option<&'a str>,
    pub sterilized: Option<bool>,
    pub image: Option<&'a str>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Product models
// ---------------------------------------------------------------------------

/// Row struct for reading from the products table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProductRow {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub mass: f64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new products.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub(crate) struct NewProductRow<'a> {
    pub owner_id: Option<i64>,
    pub name: &'a str,
    pub description: &'a str,
    pub price: f64,
    pub category: &'a str,
    pub brand: Option<&'a str>,
    pub image: Option<&'a str>,
    pub mass: f64,
    pub stock: i32,
}

/// Changeset for partial product updates.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = products)]
pub(crate) struct ProductUpdate<'a> {
    pub owner_id: Option<Option<i64>>,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<f64>,
    pub category: Option<&'a str>,
    pub brand: Option<&'a str>,
    pub image: Option<&'a str>,
    pub mass: Option<f64>,
    pub stock: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}
