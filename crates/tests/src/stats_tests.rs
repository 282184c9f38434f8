use std::sync::Arc;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use server::analysis::StaticAnalyzer;
use shared_types::Actor;

use crate::common::*;

#[tokio::test]
async fn citizen_stats() {
    let app = test_app().await;
    app.file_case(citizen(), "One", &["/a.jpg"]).await;
    let decided = app.case_at_court(&["/b.jpg"]).await;
    app.transition(decided["id"].as_i64().unwrap(), json!({ "status": "approved" }), court())
        .await;

    let (status, stats) = app.get("/api/stats", citizen()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({
            "scope": "citizen",
            "total_cases": 2,
            "pending_cases": 1,
            "approved_cases": 1,
        })
    );
}

#[tokio::test]
async fn police_stats() {
    let app = test_app().await;
    app.file_case(citizen(), "Waiting", &["/a.jpg", "/b.jpg"]).await;
    app.case_at_court(&["/c.jpg"]).await;

    let (_, stats) = app.get("/api/stats", station()).await;
    assert_eq!(stats["scope"], "police");
    assert_eq!(stats["active_cases"], 2);
    assert_eq!(stats["evidence_uploaded"], 3);
    assert_eq!(stats["sent_to_court"], 1);
    assert_eq!(stats["pending_review"], 1);

    let (_, other) = app.get("/api/stats", Actor::police(OTHER_STATION)).await;
    assert_eq!(other["active_cases"], 0);
}

#[tokio::test]
async fn court_stats_count_flagged_evidence() {
    let analyzer = Arc::new(
        StaticAnalyzer::verdict(true, 90.0)
            .with_path("/fake.jpg", Ok(shared_types::Verdict::new(false, 95.0))),
    );
    let app = test_app_with(analyzer, None).await;
    let case = app.case_at_court(&["/real.jpg", "/fake.jpg"]).await;
    for id in evidence_ids(&case) {
        app.post_empty(&format!("/api/evidence/{id}/analyze"), court())
            .await;
        app.wait_for_analysis(id, court()).await;
    }

    let (_, stats) = app.get("/api/stats", court()).await;
    assert_eq!(stats["scope"], "court");
    assert_eq!(stats["assigned_cases"], 1);
    assert_eq!(stats["awaiting_decision"], 1);
    assert_eq!(stats["evidence_analyzed"], 2);
    assert_eq!(stats["evidence_flagged"], 1);
    assert_eq!(stats["approved"], 0);
}

#[tokio::test]
async fn admin_stats_are_zero_filled() {
    let app = test_app().await;
    app.file_case(citizen(), "Only one", &["/a.jpg"]).await;

    let (_, stats) = app.get("/api/stats", admin()).await;
    assert_eq!(stats["scope"], "admin");
    assert_eq!(stats["total_cases"], 1);
    assert_eq!(
        stats["cases_by_status"],
        json!({
            "approved": 0,
            "pending": 1,
            "rejected": 0,
            "resolved": 0,
            "sent_to_court": 0,
            "under_review": 0,
        })
    );
    assert_eq!(
        stats["accounts_by_role"],
        json!({ "admin": 1, "citizen": 2, "court": 2, "police": 2 })
    );
}
