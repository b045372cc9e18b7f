//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    ///
    /// `email` is unique and stored lower-cased.
    accounts (id) {
        id -> Int8,
        email -> Varchar,
        password_hash -> Text,
        first_name -> Varchar,
        last_name -> Varchar,
        image -> Nullable<Text>,
        /// One of `user`, `manager`, `admin`.
        role -> Varchar,
        blocked -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pets. `owner_id` is `NULL` while the store holds the pet.
    pets (id) {
        id -> Int8,
        owner_id -> Nullable<Int8>,
        name -> Varchar,
        description -> Text,
        price -> Float8,
        breed -> Varchar,
        age -> Int2,
        /// One of `male`, `female`.
        gender -> Varchar,
        sterilized -> Bool,
        image -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Products. Store rows (`owner_id IS NULL`) carry sellable stock; owned
    /// rows always hold exactly one unit.
    products (id) {
        id -> Int8,
        owner_id -> Nullable<Int8>,
        name -> Varchar,
        description -> Text,
        price -> Float8,
        category -> Varchar,
        brand -> Nullable<Varchar>,
        image -> Nullable<Text>,
        mass -> Float8,
        stock -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(pets -> accounts (owner_id));
diesel::joinable!(products -> accounts (owner_id));

diesel::allow_tables_to_appear_in_same_query!(accounts, pets, products);
