use axum::{extract::State, Json};

use shared_types::{AppError, ScopedStats};

use crate::auth::AuthRequired;
use crate::service::Core;

/// GET /api/stats
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Counts for the caller's role and scope", body = ScopedStats),
        (status = 401, description = "Authentication required", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "stats"
)]
#[tracing::instrument(skip_all)]
pub async fn get_stats(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
) -> Result<Json<ScopedStats>, AppError> {
    Ok(Json(core.stats(actor).await?))
}
