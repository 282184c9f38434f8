use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use shared_types::{Account, AccountStatusRequest, AppError, Role};

use super::parse_id;
use crate::auth::AuthRequired;
use crate::service::Core;

/// GET /api/directory/{role}
///
/// Lists selectable police stations (`police`) or courts (`court`).
/// Admins also see pending and rejected entries.
#[utoipa::path(
    get,
    path = "/api/directory/{role}",
    params(("role" = String, Path, description = "citizen, police, court or admin")),
    responses(
        (status = 200, description = "Accounts with that role", body = Vec<Account>),
        (status = 400, description = "Unknown role", body = AppError),
        (status = 401, description = "Authentication required", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
#[tracing::instrument(skip_all)]
pub async fn list_accounts(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Path(role): Path<String>,
) -> Result<Json<Vec<Account>>, AppError> {
    let role = Role::parse(&role)
        .ok_or_else(|| AppError::bad_request(format!("Unknown role: {}", role)))?;
    Ok(Json(core.list_accounts(actor, role).await?))
}

/// POST /api/directory
#[utoipa::path(
    post,
    path = "/api/directory",
    request_body = Account,
    responses(
        (status = 201, description = "Directory entry saved", body = Account),
        (status = 401, description = "Admins only", body = AppError),
        (status = 422, description = "Invalid entry", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
#[tracing::instrument(skip_all)]
pub async fn register_account(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Json(body): Json<Account>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let account = core.register_account(actor, body).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// PATCH /api/directory/accounts/{id}
#[utoipa::path(
    patch,
    path = "/api/directory/accounts/{id}",
    params(("id" = i64, Path, description = "Account id")),
    request_body = AccountStatusRequest,
    responses(
        (status = 200, description = "Review state updated", body = Account),
        (status = 401, description = "Admins only", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
#[tracing::instrument(skip_all)]
pub async fn set_account_status(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<AccountStatusRequest>,
) -> Result<Json<Account>, AppError> {
    let id = parse_id(&id, "account")?;
    Ok(Json(core.set_account_status(actor, id, body.status).await?))
}

/// DELETE /api/directory/accounts/{id}
#[utoipa::path(
    delete,
    path = "/api/directory/accounts/{id}",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 204, description = "Directory entry removed"),
        (status = 401, description = "Admins only", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "directory"
)]
#[tracing::instrument(skip_all)]
pub async fn delete_account(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "account")?;
    core.delete_account(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
