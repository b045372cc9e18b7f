//! HTTP inbound adapter exposing the REST endpoints.
//!
//! Handlers translate requests into calls on the domain services held by
//! [`state::HttpState`]; [`api_scope`] mounts every versioned route.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod dto;
pub mod error;
pub mod health;
pub mod pets;
pub mod products;
pub mod schemas;
pub mod state;
pub mod stats;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Every `/api/v1` route, with extractor failures mapped to
/// `invalid_request` error bodies.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use storefront::inbound::http::api_scope;
///
/// let app = App::new().service(api_scope());
/// ```
pub fn api_scope() -> actix_web::Scope {
    web::scope("/api/v1")
        .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .service(users::register)
        .service(users::login)
        .service(users::refresh)
        .service(users::current_user)
        .service(users::update_current_user)
        .service(admin::list_accounts)
        .service(admin::get_account)
        .service(admin::block_account)
        .service(admin::unblock_account)
        .service(admin::change_role)
        .service(pets::list_pets)
        .service(pets::list_my_pets)
        .service(pets::get_pet)
        .service(pets::create_pet)
        .service(pets::update_pet)
        .service(pets::delete_pet)
        .service(pets::buy_pet)
        .service(products::list_products)
        .service(products::list_my_products)
        .service(products::get_product)
        .service(products::create_product)
        .service(products::update_product)
        .service(products::delete_product)
        .service(products::buy_product)
        .service(stats::get_stats)
}
