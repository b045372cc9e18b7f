//! Product catalogue HTTP handlers.
//!
//! ```text
//! GET    /api/v1/products?owner=me|store|<id>
//! GET    /api/v1/my/products
//! GET    /api/v1/products/{id}
//! POST   /api/v1/products
//! PUT    /api/v1/products/{id}
//! DELETE /api/v1/products/{id}
//! POST   /api/v1/products/{id}/buy
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{
    CatalogValidationError, Description, Error, ItemChanges, ItemKind, ItemName, Label, Mass,
    NewItem, Price, ProductChanges, ProductDetails, Stock,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CallerContext;
use crate::inbound::http::catalog::{
    OwnerQuery, buy_kind, delete_kind, get_kind, list_kind, list_own_kind, owner_change,
    requested_owner,
};
use crate::inbound::http::dto::ProductResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_item_id, parse_item_image};

fn default_stock() -> i64 {
    1
}

/// Request body for creating a product.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductRequest {
    #[schema(example = "Grain-free kibble")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = 24.5)]
    pub price: f64,
    #[schema(example = "Food")]
    pub category: String,
    pub brand: Option<String>,
    pub image: Option<String>,
    /// Mass in kilograms; zero when unknown.
    #[serde(default)]
    pub mass: f64,
    /// Units held. Owned products always hold exactly one.
    #[serde(default = "default_stock")]
    #[schema(example = 25)]
    pub stock: i64,
    /// Holder account; `0` or omitted lists the product in the store.
    pub owner_id: Option<i64>,
}

/// Partial product update; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub mass: Option<f64>,
    pub stock: Option<i64>,
    pub owner_id: Option<i64>,
}

fn parse_brand(raw: Option<String>) -> Result<Option<Label>, CatalogValidationError> {
    raw.filter(|brand| !brand.trim().is_empty())
        .map(|brand| Label::new(brand, "brand"))
        .transpose()
}

fn parse_product_request(payload: ProductRequest) -> Result<NewItem, Error> {
    let details = ProductDetails {
        name: ItemName::new(&payload.name)?,
        description: Description::new(&payload.description)?,
        price: Price::new(payload.price)?,
        category: Label::new(&payload.category, "category")?,
        brand: parse_brand(payload.brand)?,
        image: parse_item_image(payload.image.as_deref())?,
        mass: Mass::new(payload.mass)?,
    };
    let owner = requested_owner(payload.owner_id)?;
    Ok(NewItem::product(owner, Stock::new(payload.stock)?, details)?)
}

fn parse_product_patch(patch: ProductPatch) -> Result<ProductChanges, Error> {
    Ok(ProductChanges {
        name: patch.name.map(ItemName::new).transpose()?,
        description: patch.description.map(Description::new).transpose()?,
        price: patch.price.map(Price::new).transpose()?,
        category: patch
            .category
            .map(|raw| Label::new(raw, "category"))
            .transpose()?,
        brand: parse_brand(patch.brand)?,
        image: parse_item_image(patch.image.as_deref())?,
        mass: patch.mass.map(Mass::new).transpose()?,
        stock: patch.stock.map(Stock::new).transpose()?,
        owner: owner_change(patch.owner_id)?,
    })
}

/// List products visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(OwnerQuery),
    responses(
        (status = 200, description = "Products", body = [ProductResponse]),
        (status = 400, description = "Invalid owner filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "listProducts"
)]
#[get("/products")]
pub async fn list_products(
    state: web::Data<HttpState>,
    caller: CallerContext,
    query: web::Query<OwnerQuery>,
) -> ApiResult<web::Json<Vec<ProductResponse>>> {
    let products = list_kind(&state, &caller, ItemKind::Product, &query).await?;
    Ok(web::Json(products))
}

/// List products owned by the caller.
#[utoipa::path(
    get,
    path = "/api/v1/my/products",
    responses(
        (status = 200, description = "Caller's products", body = [ProductResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "listMyProducts"
)]
#[get("/my/products")]
pub async fn list_my_products(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<Vec<ProductResponse>>> {
    let products = list_own_kind(&state, &caller, ItemKind::Product).await?;
    Ok(web::Json(products))
}

/// Fetch one product.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "getProduct"
)]
#[get("/products/{id}")]
pub async fn get_product(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ProductResponse>> {
    let product = get_kind(&state, &caller, ItemKind::Product, path.into_inner()).await?;
    Ok(web::Json(product))
}

/// Create a product.
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Created", body = ProductResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "createProduct"
)]
#[post("/products")]
pub async fn create_product(
    state: web::Data<HttpState>,
    caller: CallerContext,
    payload: web::Json<ProductRequest>,
) -> ApiResult<HttpResponse> {
    let item = parse_product_request(payload.into_inner())?;
    let created = state.catalog.create(caller.caller(), item).await?;
    Ok(HttpResponse::Created().json(ProductResponse::try_from(created)?))
}

/// Partially update a product.
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product identifier")),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Updated", body = ProductResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "updateProduct"
)]
#[put("/products/{id}")]
pub async fn update_product(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
    payload: web::Json<ProductPatch>,
) -> ApiResult<web::Json<ProductResponse>> {
    let id = parse_item_id(path.into_inner())?;
    let changes = ItemChanges::Product(parse_product_patch(payload.into_inner())?);
    let updated = state.catalog.update(caller.caller(), id, changes).await?;
    Ok(web::Json(ProductResponse::try_from(updated)?))
}

/// Delete a product.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "deleteProduct"
)]
#[delete("/products/{id}")]
pub async fn delete_product(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    delete_kind(&state, &caller, ItemKind::Product, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Buy one unit of a store product.
///
/// The store row loses a unit and the caller receives a new row with a stock
/// of one, which is what the response describes.
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/buy",
    params(("id" = i64, Path, description = "Store product identifier")),
    responses(
        (status = 200, description = "Unit now owned by the caller", body = ProductResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found or out of stock", body = ErrorSchema),
        (status = 503, description = "Contended; retry later", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "buyProduct"
)]
#[post("/products/{id}/buy")]
pub async fn buy_product(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ProductResponse>> {
    let product = buy_kind(&state, &caller, ItemKind::Product, path.into_inner()).await?;
    Ok(web::Json(product))
}
