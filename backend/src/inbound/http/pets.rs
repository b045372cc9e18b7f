//! Pet catalogue HTTP handlers.
//!
//! ```text
//! GET    /api/v1/pets?owner=me|store|<id>
//! GET    /api/v1/my/pets
//! GET    /api/v1/pets/{id}
//! POST   /api/v1/pets
//! PUT    /api/v1/pets/{id}
//! DELETE /api/v1/pets/{id}
//! POST   /api/v1/pets/{id}/buy
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{
    Description, Error, Gender, ItemChanges, ItemKind, ItemName, Label, NewItem, PetAge,
    PetChanges, PetDetails, Price,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CallerContext;
use crate::inbound::http::catalog::{
    OwnerQuery, buy_kind, delete_kind, get_kind, list_kind, list_own_kind, owner_change,
    requested_owner,
};
use crate::inbound::http::dto::PetResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_item_id, parse_item_image};

/// Request body for creating a pet.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PetRequest {
    #[schema(example = "Rex")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = 120.0)]
    pub price: f64,
    #[schema(example = "Beagle")]
    pub breed: String,
    #[schema(example = 2)]
    pub age: i64,
    #[schema(example = "female")]
    pub gender: String,
    #[serde(default)]
    pub sterilized: bool,
    pub image: Option<String>,
    /// Holder account; `0` or omitted lists the pet in the store.
    pub owner_id: Option<i64>,
}

/// Partial pet update; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PetPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub breed: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub sterilized: Option<bool>,
    pub image: Option<String>,
    pub owner_id: Option<i64>,
}

fn parse_pet_request(payload: PetRequest) -> Result<NewItem, Error> {
    let details = PetDetails {
        name: ItemName::new(&payload.name)?,
        description: Description::new(&payload.description)?,
        price: Price::new(payload.price)?,
        breed: Label::new(&payload.breed, "breed")?,
        age: PetAge::new(payload.age)?,
        gender: payload.gender.parse::<Gender>()?,
        sterilized: payload.sterilized,
        image: parse_item_image(payload.image.as_deref())?,
    };
    Ok(NewItem::pet(requested_owner(payload.owner_id)?, details))
}

fn parse_pet_patch(patch: PetPatch) -> Result<PetChanges, Error> {
    Ok(PetChanges {
        name: patch.name.map(ItemName::new).transpose()?,
        description: patch.description.map(Description::new).transpose()?,
        price: patch.price.map(Price::new).transpose()?,
        breed: patch
            .breed
            .map(|raw| Label::new(raw, "breed"))
            .transpose()?,
        age: patch.age.map(PetAge::new).transpose()?,
        gender: patch.gender.map(|raw| raw.parse::<Gender>()).transpose()?,
        sterilized: patch.sterilized,
        image: parse_item_image(patch.image.as_deref())?,
        owner: owner_change(patch.owner_id)?,
    })
}

/// List pets visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/pets",
    params(OwnerQuery),
    responses(
        (status = 200, description = "Pets", body = [PetResponse]),
        (status = 400, description = "Invalid owner filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "listPets"
)]
#[get("/pets")]
pub async fn list_pets(
    state: web::Data<HttpState>,
    caller: CallerContext,
    query: web::Query<OwnerQuery>,
) -> ApiResult<web::Json<Vec<PetResponse>>> {
    let pets = list_kind(&state, &caller, ItemKind::Pet, &query).await?;
    Ok(web::Json(pets))
}

/// List pets owned by the caller.
#[utoipa::path(
    get,
    path = "/api/v1/my/pets",
    responses(
        (status = 200, description = "Caller's pets", body = [PetResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "listMyPets"
)]
#[get("/my/pets")]
pub async fn list_my_pets(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<Vec<PetResponse>>> {
    let pets = list_own_kind(&state, &caller, ItemKind::Pet).await?;
    Ok(web::Json(pets))
}

/// Fetch one pet.
#[utoipa::path(
    get,
    path = "/api/v1/pets/{id}",
    params(("id" = i64, Path, description = "Pet identifier")),
    responses(
        (status = 200, description = "Pet", body = PetResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "getPet"
)]
#[get("/pets/{id}")]
pub async fn get_pet(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<PetResponse>> {
    let pet = get_kind(&state, &caller, ItemKind::Pet, path.into_inner()).await?;
    Ok(web::Json(pet))
}

/// Create a pet. Only managers and admins may list pets.
#[utoipa::path(
    post,
    path = "/api/v1/pets",
    request_body = PetRequest,
    responses(
        (status = 201, description = "Created", body = PetResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "createPet"
)]
#[post("/pets")]
pub async fn create_pet(
    state: web::Data<HttpState>,
    caller: CallerContext,
    payload: web::Json<PetRequest>,
) -> ApiResult<HttpResponse> {
    let item = parse_pet_request(payload.into_inner())?;
    let created = state.catalog.create(caller.caller(), item).await?;
    Ok(HttpResponse::Created().json(PetResponse::try_from(created)?))
}

/// Partially update a pet.
#[utoipa::path(
    put,
    path = "/api/v1/pets/{id}",
    params(("id" = i64, Path, description = "Pet identifier")),
    request_body = PetPatch,
    responses(
        (status = 200, description = "Updated", body = PetResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "updatePet"
)]
#[put("/pets/{id}")]
pub async fn update_pet(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
    payload: web::Json<PetPatch>,
) -> ApiResult<web::Json<PetResponse>> {
    let id = parse_item_id(path.into_inner())?;
    let changes = ItemChanges::Pet(parse_pet_patch(payload.into_inner())?);
    let updated = state.catalog.update(caller.caller(), id, changes).await?;
    Ok(web::Json(PetResponse::try_from(updated)?))
}

/// Delete a pet.
#[utoipa::path(
    delete,
    path = "/api/v1/pets/{id}",
    params(("id" = i64, Path, description = "Pet identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "deletePet"
)]
#[delete("/pets/{id}")]
pub async fn delete_pet(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    delete_kind(&state, &caller, ItemKind::Pet, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Buy a store pet; it moves to the caller in place.
#[utoipa::path(
    post,
    path = "/api/v1/pets/{id}/buy",
    params(("id" = i64, Path, description = "Pet identifier")),
    responses(
        (status = 200, description = "Pet now owned by the caller", body = PetResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found or no longer available", body = ErrorSchema),
        (status = 503, description = "Contended; retry later", body = ErrorSchema)
    ),
    tags = ["pets"],
    operation_id = "buyPet"
)]
#[post("/pets/{id}/buy")]
pub async fn buy_pet(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<PetResponse>> {
    let pet = buy_kind(&state, &caller, ItemKind::Pet, path.into_inner()).await?;
    Ok(web::Json(pet))
}
