use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use shared_types::{AnalysisStartedResponse, AppError, Evidence};

use super::parse_id;
use crate::auth::AuthRequired;
use crate::service::Core;

/// POST /api/evidence/{id}/analyze
///
/// Returns as soon as the evidence is `processing`; poll
/// `GET /api/evidence/{id}` for the verdict.
#[utoipa::path(
    post,
    path = "/api/evidence/{id}/analyze",
    params(("id" = i64, Path, description = "Evidence id")),
    responses(
        (status = 202, description = "Analysis scheduled", body = AnalysisStartedResponse),
        (status = 401, description = "Not the assigned court", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Already processing", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "evidence"
)]
#[tracing::instrument(skip_all)]
pub async fn start_analysis(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<AnalysisStartedResponse>), AppError> {
    let id = parse_id(&id, "evidence")?;
    let evidence = core.start_analysis(actor, id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AnalysisStartedResponse {
            evidence_id: evidence.id,
            analysis_status: evidence.analysis_status,
        }),
    ))
}

/// GET /api/evidence/{id}
#[utoipa::path(
    get,
    path = "/api/evidence/{id}",
    params(("id" = i64, Path, description = "Evidence id")),
    responses(
        (status = 200, description = "Evidence with its analysis state", body = Evidence),
        (status = 401, description = "No stake in the owning case", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "evidence"
)]
#[tracing::instrument(skip_all)]
pub async fn get_evidence(
    State(core): State<Core>,
    AuthRequired(actor): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Evidence>, AppError> {
    let id = parse_id(&id, "evidence")?;
    Ok(Json(core.get_evidence_status(actor, id).await?))
}
