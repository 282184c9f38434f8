use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use shared_types::Actor;

use crate::common::*;

#[tokio::test]
async fn police_review_and_send_to_court() {
    let app = test_app().await;
    let case = app
        .file_case(citizen(), "Hit and run", &["/uploads/a.jpg", "/uploads/b.mp4"])
        .await;
    let id = case["id"].as_i64().unwrap();

    let (status, resp) = app
        .transition(id, json!({ "status": "under_review" }), station())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "under_review");
    assert!(resp.get("assigned_court").is_none());

    let (status, resp) = app
        .transition(id, json!({ "status": "sent_to_court", "court_id": COURT }), station())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "sent_to_court");
    assert_eq!(resp["assigned_court"], COURT);

    let (_, notifications) = app.get("/api/notifications", citizen()).await;
    let kinds: Vec<_> = notifications
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, vec!["sent_to_court", "case_filed"]);
    assert!(notifications[0]["message"]
        .as_str()
        .unwrap()
        .contains("District Court"));

    // The court now sees it in its queue.
    let (_, cases) = app.get("/api/cases", court()).await;
    assert_eq!(cases.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn police_cannot_skip_to_approved() {
    let app = test_app().await;
    let case = app.file_case(citizen(), "Shoplifting", &["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();

    let (status, resp) = app
        .transition(id, json!({ "status": "approved" }), station())
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["kind"], "InvalidTransition");

    let (_, case) = app.get(&format!("/api/cases/{id}"), citizen()).await;
    assert_eq!(case["status"], "pending");
}

#[tokio::test]
async fn foreign_station_is_unauthorized() {
    let app = test_app().await;
    let case = app.file_case(citizen(), "Noise complaint", &["/a.mp4"]).await;
    let id = case["id"].as_i64().unwrap();

    for actor in [Actor::police(OTHER_STATION), citizen(), court()] {
        let (status, resp) = app
            .transition(id, json!({ "status": "under_review" }), actor)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{actor}");
        assert_eq!(resp["kind"], "Unauthorized");
    }

    let (_, case) = app.get(&format!("/api/cases/{id}"), citizen()).await;
    assert_eq!(case["status"], "pending");
}

#[tokio::test]
async fn court_decides_and_resolves() {
    let app = test_app().await;
    let case = app.case_at_court(&["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();

    // A court that was not assigned may not decide.
    let (status, _) = app
        .transition(id, json!({ "status": "approved" }), Actor::court(OTHER_COURT))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, resp) = app.transition(id, json!({ "status": "approved" }), court()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "approved");
    assert_eq!(resp["assigned_court"], COURT);

    let (status, resp) = app.transition(id, json!({ "status": "resolved" }), court()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "resolved");

    // Resolved is terminal.
    for target in ["approved", "rejected", "pending", "under_review"] {
        let (status, resp) = app.transition(id, json!({ "status": target }), admin()).await;
        assert_eq!(status, StatusCode::CONFLICT, "{target}");
        assert_eq!(resp["kind"], "InvalidTransition");
    }
}

#[tokio::test]
async fn admin_may_resolve_a_decided_case() {
    let app = test_app().await;
    let case = app.case_at_court(&["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();

    let (status, _) = app.transition(id, json!({ "status": "rejected" }), court()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, resp) = app.transition(id, json!({ "status": "resolved" }), admin()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "resolved");
}

#[tokio::test]
async fn send_to_court_requires_a_registered_court() {
    let app = test_app().await;
    let case = app.file_case(citizen(), "Vandalism", &["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();
    app.transition(id, json!({ "status": "under_review" }), station())
        .await;

    let (status, resp) = app
        .transition(id, json!({ "status": "sent_to_court" }), station())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["court_id"].is_string());

    let (status, _) = app
        .transition(id, json!({ "status": "sent_to_court", "court_id": STATION }), station())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, case) = app.get(&format!("/api/cases/{id}"), station()).await;
    assert_eq!(case["status"], "under_review");
    assert!(case.get("assigned_court").is_none());
}

#[tokio::test]
async fn repeating_the_current_status_is_a_no_op() {
    let app = test_app().await;
    let case = app.case_at_court(&["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();
    let (_, before) = app.get("/api/notifications", citizen()).await;

    let (status, resp) = app
        .transition(id, json!({ "status": "sent_to_court", "court_id": COURT }), station())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["assigned_court"], COURT);

    let (status, resp) = app
        .transition(id, json!({ "status": "sent_to_court", "court_id": OTHER_COURT }), station())
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["kind"], "InvalidTransition");

    let (_, after) = app.get("/api/notifications", citizen()).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn unknown_target_status_is_rejected_before_the_core() {
    let app = test_app().await;
    let case = app.file_case(citizen(), "Lost dog", &["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();

    let (status, _) = app
        .transition(id, json!({ "status": "closed" }), station())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn transition_on_missing_case_is_404() {
    let app = test_app().await;
    let (status, resp) = app
        .transition(4242, json!({ "status": "under_review" }), station())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["kind"], "NotFound");
}

#[tokio::test]
async fn concurrent_transitions_apply_once() {
    let app = test_app().await;
    let case = app.file_case(citizen(), "Race", &["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();

    let (a, b) = tokio::join!(
        app.transition(id, json!({ "status": "under_review" }), station()),
        app.transition(id, json!({ "status": "under_review" }), station()),
    );
    // The second caller finds the case already there and gets a no-op.
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(a.1["status"], "under_review");
    assert_eq!(b.1["status"], "under_review");

    let (_, notifications) = app.get("/api/notifications", citizen()).await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);
}
