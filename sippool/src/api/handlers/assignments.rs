use crate::AppState;
use crate::api::models::assignments::AssignRequest;
use crate::api::models::envelope::ApiResponse;
use crate::api::models::sip_configs::SipConfigResponse;
use crate::errors::Result;
use crate::types::UserId;
use axum::{
    Json,
    extract::{Path, State},
};

#[utoipa::path(
    post,
    path = "/assignments",
    tag = "assignments",
    summary = "Assign the next available SIP line to a user",
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Line assigned (or already held by this user)", body = ApiResponse<SipConfigResponse>),
        (status = 400, description = "Malformed request body"),
        (status = 503, description = "No lines available in the pool"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn assign_next(
    State(state): State<AppState>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<ApiResponse<SipConfigResponse>>> {
    request.validate()?;
    let record = state.assigner.assign_next(&state.db, request).await?;
    Ok(Json(ApiResponse::ok(record.into())))
}

#[utoipa::path(
    get,
    path = "/assignments/{user_id}",
    tag = "assignments",
    summary = "Get the SIP line currently held by a user",
    params(("user_id" = String, Path, description = "User to look up")),
    responses(
        (status = 200, description = "The user's current assignment; data is absent when they hold nothing", body = ApiResponse<SipConfigResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<SipConfigResponse>>> {
    let envelope = match state.assigner.current_assignment(&state.db, user_id).await? {
        Some(record) => ApiResponse::ok(record.into()),
        None => ApiResponse::ok_empty(),
    };
    Ok(Json(envelope))
}

#[utoipa::path(
    delete,
    path = "/assignments/{user_id}",
    tag = "assignments",
    summary = "Release whatever line a user holds (logout/deactivation hook)",
    params(("user_id" = String, Path, description = "User whose hold is released")),
    responses(
        (status = 200, description = "Released; idempotent - data is absent when there was nothing to release", body = ApiResponse<SipConfigResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn release_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<SipConfigResponse>>> {
    let envelope = match state.assigner.release_for_user(&state.db, user_id).await? {
        Some(record) => ApiResponse::ok(record.into()),
        None => ApiResponse::ok_empty(),
    };
    Ok(Json(envelope))
}
