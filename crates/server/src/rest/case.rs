use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use shared_types::{AppError, Case, FileCaseRequest, TransitionOpts, TransitionRequest};

use super::parse_id;
use crate::auth::AuthRequired;
use crate::service::Core;

/// POST /api/cases
#[utoipa::path(
    post,
    path = "/api/cases",
    request_body = FileCaseRequest,
    responses(
        (status = 201, description = "Case filed", body = Case),
        (status = 401, description = "Not a citizen", body = AppError),
        (status = 422, description = "Invalid filing", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip_all)]
pub async fn file_case(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Json(body): Json<FileCaseRequest>,
) -> Result<(StatusCode, Json<Case>), AppError> {
    let case = core.file_case(actor, body).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

/// GET /api/cases
#[utoipa::path(
    get,
    path = "/api/cases",
    responses(
        (status = 200, description = "Cases in the caller's scope", body = Vec<Case>),
        (status = 401, description = "Authentication required", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip_all)]
pub async fn list_cases(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
) -> Result<Json<Vec<Case>>, AppError> {
    Ok(Json(core.list_cases(actor).await?))
}

/// GET /api/cases/{id}
#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(("id" = i64, Path, description = "Case id")),
    responses(
        (status = 200, description = "Case found", body = Case),
        (status = 401, description = "No stake in this case", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip_all)]
pub async fn get_case(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Case>, AppError> {
    let id = parse_id(&id, "case")?;
    Ok(Json(core.get_case(actor, id).await?))
}

/// DELETE /api/cases/{id}
#[utoipa::path(
    delete,
    path = "/api/cases/{id}",
    params(("id" = i64, Path, description = "Case id")),
    responses(
        (status = 204, description = "Case and its evidence deleted"),
        (status = 401, description = "Not the filer", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip_all)]
pub async fn delete_case(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "case")?;
    core.delete_case(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/cases/{id}/transition
#[utoipa::path(
    post,
    path = "/api/cases/{id}/transition",
    request_body = TransitionRequest,
    params(("id" = i64, Path, description = "Case id")),
    responses(
        (status = 200, description = "Case after the transition", body = Case),
        (status = 401, description = "Actor may not take this edge", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "No such edge from the current status", body = AppError),
        (status = 422, description = "Precondition failed", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip_all)]
pub async fn transition_case(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<Case>, AppError> {
    let id = parse_id(&id, "case")?;
    let case = core
        .transition(actor, id, body.status, TransitionOpts::from(&body))
        .await?;
    Ok(Json(case))
}
