//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler, the health probes, the
//! request and response DTOs, and the bearer authentication scheme. Swagger
//! UI serves it in debug builds.

use crate::inbound::http::admin::RoleRequest;
use crate::inbound::http::dto::{
    AccountResponse, ItemCountsResponse, PetResponse, ProductResponse, SessionResponse,
    StatsResponse, TokenResponse,
};
use crate::inbound::http::health::ProbeResponse;
use crate::inbound::http::pets::{PetPatch, PetRequest};
use crate::inbound::http::products::{ProductPatch, ProductRequest};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::{LoginRequest, ProfileRequest, RegisterRequest};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Register the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token issued by POST /api/v1/login, /register, or /refresh.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Storefront API",
        description = "Multi-tenant pet and product marketplace with atomic store-to-buyer transfers."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::refresh,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::admin::list_accounts,
        crate::inbound::http::admin::get_account,
        crate::inbound::http::admin::block_account,
        crate::inbound::http::admin::unblock_account,
        crate::inbound::http::admin::change_role,
        crate::inbound::http::pets::list_pets,
        crate::inbound::http::pets::list_my_pets,
        crate::inbound::http::pets::get_pet,
        crate::inbound::http::pets::create_pet,
        crate::inbound::http::pets::update_pet,
        crate::inbound::http::pets::delete_pet,
        crate::inbound::http::pets::buy_pet,
        crate::inbound::http::products::list_products,
        crate::inbound::http::products::list_my_products,
        crate::inbound::http::products::get_product,
        crate::inbound::http::products::create_product,
        crate::inbound::http::products::update_product,
        crate::inbound::http::products::delete_product,
        crate::inbound::http::products::buy_product,
        crate::inbound::http::stats::get_stats,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        AccountResponse,
        SessionResponse,
        TokenResponse,
        RegisterRequest,
        LoginRequest,
        ProfileRequest,
        RoleRequest,
        PetRequest,
        PetPatch,
        PetResponse,
        ProductRequest,
        ProductPatch,
        ProductResponse,
        ItemCountsResponse,
        StatsResponse,
        ProbeResponse,
    )),
    tags(
        (name = "users", description = "Registration, login, and the caller's profile"),
        (name = "admin", description = "Account administration"),
        (name = "pets", description = "Pet catalogue and purchases"),
        (name = "products", description = "Product catalogue and purchases"),
        (name = "stats", description = "Marketplace statistics"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
