//! Public marketplace statistics.
//!
//! ```text
//! GET /api/v1/stats
//! ```

use actix_web::{get, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::StatsResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Account count and per-kind item counts.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    responses(
        (status = 200, description = "Marketplace statistics", body = StatsResponse),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["stats"],
    operation_id = "getStats",
    security([])
)]
#[get("/stats")]
pub async fn get_stats(state: web::Data<HttpState>) -> ApiResult<web::Json<StatsResponse>> {
    let stats = state.stats.snapshot().await?;
    Ok(web::Json(StatsResponse::from(stats)))
}
