//! Account administration handlers. Every route requires the stored `admin`
//! role.
//!
//! ```text
//! GET  /api/v1/admin/users
//! GET  /api/v1/admin/users/{id}
//! POST /api/v1/admin/users/{id}/block
//! POST /api/v1/admin/users/{id}/unblock
//! PUT  /api/v1/admin/users/{id}/role {"role":"manager"}
//! ```

use actix_web::{get, post, put, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Error, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CallerContext;
use crate::inbound::http::dto::AccountResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_account_id;

/// Role change body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RoleRequest {
    #[schema(example = "manager")]
    pub role: String,
}

impl TryFrom<RoleRequest> for Role {
    type Error = Error;

    fn try_from(value: RoleRequest) -> Result<Self, Self::Error> {
        Ok(value.role.parse::<Role>()?)
    }
}

/// List every account.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses(
        (status = 200, description = "Accounts", body = [AccountResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listAccounts"
)]
#[get("/admin/users")]
pub async fn list_accounts(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<Vec<AccountResponse>>> {
    let accounts = state.accounts.list_accounts(caller.caller()).await?;
    Ok(web::Json(
        accounts.into_iter().map(AccountResponse::from).collect(),
    ))
}

/// Fetch one account.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{id}",
    params(("id" = i64, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "getAccount"
)]
#[get("/admin/users/{id}")]
pub async fn get_account(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<AccountResponse>> {
    let id = parse_account_id(path.into_inner())?;
    let account = state.accounts.account(caller.caller(), id).await?;
    Ok(web::Json(AccountResponse::from(account)))
}

/// Block an account. Administrators cannot block themselves.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/block",
    params(("id" = i64, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Blocked account", body = AccountResponse),
        (status = 400, description = "Self-block", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "blockAccount"
)]
#[post("/admin/users/{id}/block")]
pub async fn block_account(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<AccountResponse>> {
    let id = parse_account_id(path.into_inner())?;
    let account = state.accounts.set_blocked(caller.caller(), id, true).await?;
    Ok(web::Json(AccountResponse::from(account)))
}

/// Lift a block.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/unblock",
    params(("id" = i64, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Unblocked account", body = AccountResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "unblockAccount"
)]
#[post("/admin/users/{id}/unblock")]
pub async fn unblock_account(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<AccountResponse>> {
    let id = parse_account_id(path.into_inner())?;
    let account = state.accounts.set_blocked(caller.caller(), id, false).await?;
    Ok(web::Json(AccountResponse::from(account)))
}

/// Change an account's role. Administrators cannot demote themselves.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    params(("id" = i64, Path, description = "Account identifier")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 400, description = "Unknown role or self-demotion", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "changeAccountRole"
)]
#[put("/admin/users/{id}/role")]
pub async fn change_role(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
    payload: web::Json<RoleRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let id = parse_account_id(path.into_inner())?;
    let role = Role::try_from(payload.into_inner())?;
    let account = state.accounts.change_role(caller.caller(), id, role).await?;
    Ok(web::Json(AccountResponse::from(account)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{TestWorld, bearer, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[case(Role::User)]
    #[case(Role::Manager)]
    #[actix_rt::test]
    async fn non_admins_are_forbidden(#[case] role: Role) {
        let world = TestWorld::new();
        let caller = world.account("caller@example.com", role).await;
        let app = test::init_service(test_app(world.state())).await;

        let request = test::TestRequest::get()
            .uri("/api/v1/admin/users")
            .insert_header(bearer(&world.token_for(caller.id, role)))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn admin_role_claims_are_not_trusted() {
        let world = TestWorld::new();
        let user = world.account("user@example.com", Role::User).await;
        let app = test::init_service(test_app(world.state())).await;

        let request = test::TestRequest::get()
            .uri("/api/v1/admin/users")
            .insert_header(bearer(&world.token_for(user.id, Role::Admin)))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn blocking_takes_effect_on_the_next_request() {
        let world = TestWorld::new();
        let admin = world.account("admin@example.com", Role::Admin).await;
        let user = world.account("user@example.com", Role::User).await;
        let user_token = world.token_for(user.id, Role::User);
        let app = test::init_service(test_app(world.state())).await;

        let request = test::TestRequest::post()
            .uri(&format!("/api/v1/admin/users/{}/block", user.id))
            .insert_header(bearer(&world.token_for(admin.id, Role::Admin)))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["blocked"], true);

        let request = test::TestRequest::get()
            .uri("/api/v1/users/me")
            .insert_header(bearer(&user_token))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = test::TestRequest::post()
            .uri(&format!("/api/v1/admin/users/{}/unblock", user.id))
            .insert_header(bearer(&world.token_for(admin.id, Role::Admin)))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["blocked"], false);
    }

    #[actix_web::test]
    async fn admins_cannot_block_themselves() {
        let world = TestWorld::new();
        let admin = world.account("admin@example.com", Role::Admin).await;
        let app = test::init_service(test_app(world.state())).await;

        let request = test::TestRequest::post()
            .uri(&format!("/api/v1/admin/users/{}/block", admin.id))
            .insert_header(bearer(&world.token_for(admin.id, Role::Admin)))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[case("manager", StatusCode::OK)]
    #[case("overlord", StatusCode::BAD_REQUEST)]
    #[actix_rt::test]
    async fn role_changes_validate_the_role(#[case] role: &str, #[case] expected: StatusCode) {
        let world = TestWorld::new();
        let admin = world.account("admin@example.com", Role::Admin).await;
        let user = world.account("user@example.com", Role::User).await;
        let app = test::init_service(test_app(world.state())).await;

        let request = test::TestRequest::put()
            .uri(&format!("/api/v1/admin/users/{}/role", user.id))
            .insert_header(bearer(&world.token_for(admin.id, Role::Admin)))
            .set_json(json!({ "role": role }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), expected);
    }

    #[actix_web::test]
    async fn missing_accounts_are_not_found() {
        let world = TestWorld::new();
        let admin = world.account("admin@example.com", Role::Admin).await;
        let app = test::init_service(test_app(world.state())).await;

        let request = test::TestRequest::get()
            .uri("/api/v1/admin/users/999")
            .insert_header(bearer(&world.token_for(admin.id, Role::Admin)))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
