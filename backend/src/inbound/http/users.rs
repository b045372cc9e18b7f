//! Account HTTP handlers.
//!
//! ```text
//! POST /api/v1/register {"firstName":"Ada","lastName":"Lovelace","email":"ada@example.com","password":"Str0ng!pass"}
//! POST /api/v1/login    {"email":"ada@example.com","password":"Str0ng!pass"}
//! POST /api/v1/refresh
//! GET  /api/v1/users/me
//! PUT  /api/v1/users/me
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{
    EmailAddress, Error, LoginCredentials, Password, PersonName, ProfileChanges, Registration,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CallerContext;
use crate::inbound::http::dto::{AccountResponse, SessionResponse, TokenResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_account_image;

/// Registration body. Registration always creates a `user`; a `role` field is
/// rejected as unknown.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// At least 8 characters with upper-case, lower-case, digit and symbol.
    #[schema(example = "Str0ng!pass")]
    pub password: String,
    pub image: Option<String>,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: EmailAddress::new(&value.email)?,
            password: Password::new(value.password)?,
            first_name: PersonName::new(&value.first_name, "firstName")?,
            last_name: PersonName::new(&value.last_name, "lastName")?,
            image: parse_account_image(value.image.as_deref())?,
        })
    }
}

/// Login body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
}

impl From<LoginRequest> for LoginCredentials {
    fn from(value: LoginRequest) -> Self {
        Self::new(value.email, value.password)
    }
}

/// Profile edit body; at least one field must be present.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl TryFrom<ProfileRequest> for ProfileChanges {
    type Error = Error;

    fn try_from(value: ProfileRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: value.email.map(EmailAddress::new).transpose()?,
            first_name: value
                .first_name
                .map(|raw| PersonName::new(raw, "firstName"))
                .transpose()?,
            last_name: value
                .last_name
                .map(|raw| PersonName::new(raw, "lastName"))
                .transpose()?,
            image: parse_account_image(value.image.as_deref())?,
        })
    }
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = SessionResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let session = state.accounts.register(registration).await?;
    Ok(HttpResponse::Created().json(SessionResponse::from(session)))
}

/// Exchange credentials for a bearer token.
///
/// Unknown emails and wrong passwords produce the same `401`.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 403, description = "Account blocked", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<SessionResponse>> {
    let session = state
        .accounts
        .login(LoginCredentials::from(payload.into_inner()))
        .await?;
    Ok(web::Json(SessionResponse::from(session)))
}

/// Issue a short-lived token carrying the caller's stored role.
#[utoipa::path(
    post,
    path = "/api/v1/refresh",
    responses(
        (status = 200, description = "Fresh token", body = TokenResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Account blocked", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "refreshToken"
)]
#[post("/refresh")]
pub async fn refresh(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<TokenResponse>> {
    let token = state.accounts.refresh(caller.caller())?;
    Ok(web::Json(TokenResponse::from(token)))
}

/// The caller's account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Account blocked", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<AccountResponse>> {
    let account = state.accounts.profile(caller.caller()).await?;
    Ok(web::Json(AccountResponse::from(account)))
}

/// Edit the caller's name, email, or image.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
#[put("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
    payload: web::Json<ProfileRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let changes = ProfileChanges::try_from(payload.into_inner())?;
    let account = state.accounts.update_profile(caller.caller(), changes).await?;
    Ok(web::Json(AccountResponse::from(account)))
}
