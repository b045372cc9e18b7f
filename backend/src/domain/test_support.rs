//! Builders for domain values used across unit tests.

use chrono::Utc;

use super::{
    Account, AccountId, Description, EmailAddress, Gender, ItemName, Label, Mass, PasswordHash,
    PersonName, PetAge, PetDetails, Price, ProductDetails, Role,
};

pub(crate) fn account_id(raw: i64) -> AccountId {
    AccountId::new(raw).expect("valid account id")
}

pub(crate) fn sample_account(id: i64, role: Role, blocked: bool) -> Account {
    let now = Utc::now();
    Account {
        id: account_id(id),
        email: EmailAddress::new(format!("user{id}@example.com")).expect("valid email"),
        password_hash: PasswordHash::from_phc("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"),
        first_name: PersonName::new("Ada", "firstName").expect("valid name"),
        last_name: PersonName::new("Lovelace", "lastName").expect("valid name"),
        image: None,
        role,
        blocked,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn pet_details(name: &str) -> PetDetails {
    PetDetails {
        name: ItemName::new(name).expect("valid name"),
        description: Description::new("Friendly and house-trained").expect("valid description"),
        price: Price::new(120.0).expect("valid price"),
        breed: Label::new("Beagle", "breed").expect("valid breed"),
        age: PetAge::new(2).expect("valid age"),
        gender: Gender::Female,
        sterilized: true,
        image: None,
    }
}

pub(crate) fn product_details(name: &str) -> ProductDetails {
    ProductDetails {
        name: ItemName::new(name).expect("valid name"),
        description: Description::new("Grain-free kibble").expect("valid description"),
        price: Price::new(24.5).expect("valid price"),
        category: Label::new("Food", "category").expect("valid category"),
        brand: Some(Label::new("Acme", "brand").expect("valid brand")),
        image: None,
        mass: Mass::new(2.5).expect("valid mass"),
    }
}
