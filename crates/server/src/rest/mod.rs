pub mod case;
pub mod directory;
pub mod evidence;
pub mod notification;
pub mod stats;

use axum::{routing::{get, patch, post}, Router};
use shared_types::AppError;

use crate::db::AppState;

/// Parse a numeric path id, rejecting anything else with 400.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request(format!("Invalid {} id format", what)))
}

/// Build the REST API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Cases
        .route("/api/cases", get(case::list_cases).post(case::file_case))
        .route("/api/cases/{id}", get(case::get_case).delete(case::delete_case))
        .route("/api/cases/{id}/transition", post(case::transition_case))
        // Evidence analysis
        .route("/api/evidence/{id}", get(evidence::get_evidence))
        .route("/api/evidence/{id}/analyze", post(evidence::start_analysis))
        // Notifications
        .route("/api/notifications", get(notification::list_notifications))
        .route("/api/notifications/unread-count", get(notification::unread_count))
        .route("/api/notifications/{id}/read", patch(notification::mark_read))
        // Stats
        .route("/api/stats", get(stats::get_stats))
        // Directory
        .route("/api/directory", post(directory::register_account))
        .route("/api/directory/{role}", get(directory::list_accounts))
        .route(
            "/api/directory/accounts/{id}",
            patch(directory::set_account_status).delete(directory::delete_account),
        )
}
