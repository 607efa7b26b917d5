use crate::AppState;
use crate::api::models::envelope::ApiResponse;
use crate::errors::Result;
use crate::stats::{self, PoolStats};
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/stats/overview",
    tag = "stats",
    summary = "Pool utilization overview",
    responses(
        (status = 200, description = "Current totals; available + assigned always equals total", body = ApiResponse<PoolStats>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn overview(State(state): State<AppState>) -> Result<Json<ApiResponse<PoolStats>>> {
    let stats = stats::pool_stats(&state.db).await?;
    Ok(Json(ApiResponse::ok(stats)))
}
