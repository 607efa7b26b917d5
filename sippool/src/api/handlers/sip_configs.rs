use crate::AppState;
use crate::api::models::assignments::{AssignRequest, ReleaseRequest};
use crate::api::models::envelope::ApiResponse;
use crate::api::models::sip_configs::{ListSipConfigsQuery, SipConfigCreate, SipConfigResponse, SipConfigUpdate};
use crate::db::{
    errors::DbError,
    handlers::{Repository, SipConfigs, sip_configs::SipConfigFilter},
};
use crate::errors::{Error, Result};
use crate::types::ConfigId;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

fn not_found(id: ConfigId) -> Error {
    Error::NotFound {
        resource: "SIP config".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/sip-configs",
    tag = "sip-configs",
    summary = "List SIP configs",
    params(ListSipConfigsQuery),
    responses(
        (status = 200, description = "Records ordered by id ascending", body = ApiResponse<Vec<SipConfigResponse>>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_sip_configs(
    State(state): State<AppState>,
    Query(query): Query<ListSipConfigsQuery>,
) -> Result<Json<ApiResponse<Vec<SipConfigResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = SipConfigs::new(&mut conn);

    let mut filter = SipConfigFilter::new(query.pagination.skip(), query.pagination.limit());
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }

    let records = repo.list(&filter).await?;
    Ok(Json(ApiResponse::ok(records.into_iter().map(Into::into).collect())))
}

#[utoipa::path(
    post,
    path = "/sip-configs",
    tag = "sip-configs",
    summary = "Provision a new SIP config",
    request_body = SipConfigCreate,
    responses(
        (status = 201, description = "Record created", body = ApiResponse<SipConfigResponse>),
        (status = 400, description = "Malformed request body"),
        (status = 409, description = "A record with this username and domain already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_sip_config(
    State(state): State<AppState>,
    Json(request): Json<SipConfigCreate>,
) -> Result<(StatusCode, Json<ApiResponse<SipConfigResponse>>)> {
    for (field, value) in [
        ("username", &request.username),
        ("password", &request.password),
        ("domain", &request.domain),
        ("server", &request.server),
    ] {
        if value.trim().is_empty() {
            return Err(Error::BadRequest {
                message: format!("{field} must not be empty"),
            });
        }
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = SipConfigs::new(&mut conn);

    let record = repo.create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record.into()))))
}

#[utoipa::path(
    get,
    path = "/sip-configs/available/next",
    tag = "sip-configs",
    summary = "Peek at the first available record",
    description = "Read-only and non-reserving: two callers may see the same record here. \
                   Callers needing a guaranteed hold must use POST /assignments instead of \
                   pre-selecting an id from this endpoint.",
    responses(
        (status = 200, description = "First available record; data is absent when the pool is fully assigned", body = ApiResponse<SipConfigResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn peek_next_available(State(state): State<AppState>) -> Result<Json<ApiResponse<SipConfigResponse>>> {
    let envelope = match state.assigner.peek_available(&state.db).await? {
        Some(record) => ApiResponse::ok(record.into()),
        None => ApiResponse::ok_empty(),
    };
    Ok(Json(envelope))
}

#[utoipa::path(
    get,
    path = "/sip-configs/{id}",
    tag = "sip-configs",
    summary = "Get a SIP config by id",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "The record", body = ApiResponse<SipConfigResponse>),
        (status = 404, description = "Unknown id"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_sip_config(
    State(state): State<AppState>,
    Path(id): Path<ConfigId>,
) -> Result<Json<ApiResponse<SipConfigResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = SipConfigs::new(&mut conn);

    let record = repo.get_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::ok(record.into())))
}

#[utoipa::path(
    patch,
    path = "/sip-configs/{id}",
    tag = "sip-configs",
    summary = "Correct SIP account fields on an unassigned record",
    params(("id" = i64, Path, description = "Record id")),
    request_body = SipConfigUpdate,
    responses(
        (status = 200, description = "Updated record", body = ApiResponse<SipConfigResponse>),
        (status = 404, description = "Unknown id"),
        (status = 409, description = "Record is currently assigned"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_sip_config(
    State(state): State<AppState>,
    Path(id): Path<ConfigId>,
    Json(request): Json<SipConfigUpdate>,
) -> Result<Json<ApiResponse<SipConfigResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = SipConfigs::new(&mut conn);

    let record = repo.update(id, &request.into()).await.map_err(|e| match e {
        DbError::NotFound => not_found(id),
        DbError::AssignmentConflict { .. } => Error::Conflict {
            message: format!("SIP config {id} is currently assigned and cannot be modified"),
        },
        e => Error::Database(e),
    })?;

    Ok(Json(ApiResponse::ok(record.into())))
}

#[utoipa::path(
    delete,
    path = "/sip-configs/{id}",
    tag = "sip-configs",
    summary = "Retire an unassigned record from the pool",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record deleted", body = ApiResponse<SipConfigResponse>),
        (status = 404, description = "Unknown id"),
        (status = 409, description = "Record is currently assigned"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_sip_config(
    State(state): State<AppState>,
    Path(id): Path<ConfigId>,
) -> Result<Json<ApiResponse<SipConfigResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = SipConfigs::new(&mut conn);

    let deleted = repo.delete(id).await.map_err(|e| match e {
        DbError::AssignmentConflict { .. } => Error::Conflict {
            message: format!("SIP config {id} is currently assigned and cannot be deleted"),
        },
        e => Error::Database(e),
    })?;

    if !deleted {
        return Err(not_found(id));
    }
    Ok(Json(ApiResponse::ok_empty()))
}

#[utoipa::path(
    put,
    path = "/sip-configs/{id}/assign",
    tag = "sip-configs",
    summary = "Assign a specific record to a user (admin-directed)",
    params(("id" = i64, Path, description = "Record id")),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Record assigned (or already held by this user)", body = ApiResponse<SipConfigResponse>),
        (status = 400, description = "Malformed request body"),
        (status = 404, description = "Unknown id"),
        (status = 409, description = "Record is held by another user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn assign_sip_config(
    State(state): State<AppState>,
    Path(id): Path<ConfigId>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<ApiResponse<SipConfigResponse>>> {
    request.validate()?;
    let record = state.assigner.assign_specific(&state.db, id, request).await?;
    Ok(Json(ApiResponse::ok(record.into())))
}

#[utoipa::path(
    put,
    path = "/sip-configs/{id}/release",
    tag = "sip-configs",
    summary = "Release a record back to the pool",
    description = "With a `user_id` in the body the release is owner-checked (self-service); \
                   without a body it is an admin force-release.",
    params(("id" = i64, Path, description = "Record id")),
    request_body = ReleaseRequest,
    responses(
        (status = 200, description = "Record released", body = ApiResponse<SipConfigResponse>),
        (status = 404, description = "Unknown id"),
        (status = 409, description = "Record is not held by the requesting user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn release_sip_config(
    State(state): State<AppState>,
    Path(id): Path<ConfigId>,
    body: Option<Json<ReleaseRequest>>,
) -> Result<Json<ApiResponse<SipConfigResponse>>> {
    let requesting_user = body.and_then(|Json(request)| request.user_id);
    let record = state.assigner.release(&state.db, id, requesting_user).await?;
    Ok(Json(ApiResponse::ok(record.into())))
}
