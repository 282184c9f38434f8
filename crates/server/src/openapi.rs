use axum::extract::DefaultBodyLimit;
use axum::Router;
use shared_types::{
    Account, AccountStatus, AccountStatusRequest, AnalysisStartedResponse, AnalysisStatus, AppError, AppErrorKind, Case, CaseStatus,
    CitizenStats, AdminStats, CourtStats, Evidence, EvidenceUpload, FileCaseRequest, FileType,
    Notification, NotificationType, PoliceStats, Role, ScopedStats, TransitionRequest,
    UnreadCountResponse, Verdict,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable};

use crate::auth::middleware::auth_middleware;
use crate::db::AppState;
use crate::health;
use crate::logging::http_trace_layer;
use crate::rest;
use crate::telemetry::OtelTraceLayer;

/// Request bodies are JSON metadata only; evidence files live elsewhere.
const MAX_BODY_BYTES: usize = 1024 * 1024;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        // Cases
        rest::case::file_case,
        rest::case::list_cases,
        rest::case::get_case,
        rest::case::delete_case,
        rest::case::transition_case,
        // Evidence
        rest::evidence::start_analysis,
        rest::evidence::get_evidence,
        // Notifications
        rest::notification::list_notifications,
        rest::notification::unread_count,
        rest::notification::mark_read,
        // Stats
        rest::stats::get_stats,
        // Directory
        rest::directory::list_accounts,
        rest::directory::register_account,
        rest::directory::set_account_status,
        rest::directory::delete_account,
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind, Role, Account, AccountStatus, AccountStatusRequest,
        Case, CaseStatus, FileCaseRequest, TransitionRequest,
        Evidence, EvidenceUpload, FileType, AnalysisStatus, Verdict, AnalysisStartedResponse,
        Notification, NotificationType, UnreadCountResponse,
        ScopedStats, CitizenStats, PoliceStats, CourtStats, AdminStats,
        health::HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "cases", description = "Case filing and lifecycle endpoints"),
        (name = "evidence", description = "Evidence authenticity analysis endpoints"),
        (name = "notifications", description = "Per-account notification inbox"),
        (name = "stats", description = "Role-scoped dashboard counts"),
        (name = "directory", description = "Police station and court directory"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Case Intake API",
        description = "Citizen case filing, police review, court adjudication and evidence analysis",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Build an Axum router that serves the API docs at `/docs`
/// and the REST API at `/api/*`.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(rest::api_router())
        .route("/health", axum::routing::get(health::health_check))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}

/// The full HTTP stack: routes plus tracing, auth and request-id layers.
/// OTLP spans are added only when telemetry is on.
pub fn app(state: AppState, telemetry: bool) -> Router {
    let keys = state.auth.clone();
    let mut router = api_router(state);

    if telemetry {
        router = router.layer(OtelTraceLayer);
    }

    router
        .layer(http_trace_layer())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn_with_state(keys, auth_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
