use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use shared_types::Actor;

use crate::common::*;

#[tokio::test]
async fn full_lifecycle_notifies_the_filer() {
    let app = test_app().await;
    let case = app.case_at_court(&["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();
    app.transition(id, json!({ "status": "approved" }), court()).await;
    app.transition(id, json!({ "status": "resolved" }), court()).await;

    let (status, notifications) = app.get("/api/notifications", citizen()).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<_> = notifications
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        kinds,
        vec!["case_resolved", "case_approved", "sent_to_court", "case_filed"]
    );
    for n in notifications.as_array().unwrap() {
        assert_eq!(n["recipient_id"], CITIZEN);
        assert_eq!(n["case_id"], id);
        assert_eq!(n["is_read"], false);
        assert!(n["message"].as_str().unwrap().contains("Parking lot collision"));
    }

    // Police and courts get nothing.
    for actor in [station(), court()] {
        let (_, list) = app.get("/api/notifications", actor).await;
        assert_eq!(list, json!([]));
    }
}

#[tokio::test]
async fn rejection_is_reported() {
    let app = test_app().await;
    let case = app.case_at_court(&["/a.jpg"]).await;
    app.transition(case["id"].as_i64().unwrap(), json!({ "status": "rejected" }), court())
        .await;

    let (_, notifications) = app.get("/api/notifications", citizen()).await;
    assert_eq!(notifications[0]["type"], "case_rejected");
    assert_eq!(
        notifications[0]["message"],
        "The court has rejected your case 'Parking lot collision'."
    );
}

#[tokio::test]
async fn unread_count_and_mark_read() {
    let app = test_app().await;
    app.case_at_court(&["/a.jpg"]).await;

    let (status, resp) = app.get("/api/notifications/unread-count", citizen()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({ "unread": 2 }));

    let (_, list) = app.get("/api/notifications", citizen()).await;
    let newest = list[0]["id"].as_i64().unwrap();

    let (status, resp) = app
        .patch(&format!("/api/notifications/{newest}/read"), citizen())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["is_read"], true);

    // Idempotent.
    let (status, resp) = app
        .patch(&format!("/api/notifications/{newest}/read"), citizen())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["is_read"], true);

    let (_, resp) = app.get("/api/notifications/unread-count", citizen()).await;
    assert_eq!(resp["unread"], 1);
}

#[tokio::test]
async fn notifications_belong_to_their_recipient() {
    let app = test_app().await;
    app.file_case(citizen(), "Private", &["/a.jpg"]).await;
    let (_, list) = app.get("/api/notifications", citizen()).await;
    let id = list[0]["id"].as_i64().unwrap();

    let (_, other) = app.get("/api/notifications", Actor::citizen(OTHER_CITIZEN)).await;
    assert_eq!(other, json!([]));

    let (status, resp) = app
        .patch(&format!("/api/notifications/{id}/read"), Actor::citizen(OTHER_CITIZEN))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["kind"], "Unauthorized");

    let (_, resp) = app.get("/api/notifications/unread-count", citizen()).await;
    assert_eq!(resp["unread"], 1);
}

#[tokio::test]
async fn unknown_notification_is_404() {
    let app = test_app().await;
    let (status, _) = app.patch("/api/notifications/31337/read", citizen()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
