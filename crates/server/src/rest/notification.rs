use axum::{
    extract::{Path, State},
    Json,
};

use shared_types::{AppError, Notification, UnreadCountResponse};

use super::parse_id;
use crate::auth::AuthRequired;
use crate::service::Core;

/// GET /api/notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = Vec<Notification>),
        (status = 401, description = "Authentication required", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
#[tracing::instrument(skip_all)]
pub async fn list_notifications(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(core.list_notifications(actor).await?))
}

/// GET /api/notifications/unread-count
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCountResponse),
        (status = 401, description = "Authentication required", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
#[tracing::instrument(skip_all)]
pub async fn unread_count(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = core.unread_count(actor).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// PATCH /api/notifications/{id}/read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 401, description = "Not the recipient", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
#[tracing::instrument(skip_all)]
pub async fn mark_read(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Notification>, AppError> {
    let id = parse_id(&id, "notification")?;
    Ok(Json(core.mark_notification_read(actor, id).await?))
}
