use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn list_stations_and_courts() {
    let app = test_app().await;

    let (status, stations) = app.get("/api/directory/police", citizen()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stations,
        json!([
            { "id": STATION, "name": "Central Station", "role": "police", "status": "approved" },
            { "id": OTHER_STATION, "name": "Harbor Station", "role": "police", "status": "approved" },
        ])
    );

    let (_, courts) = app.get("/api/directory/court", station()).await;
    let ids: Vec<_> = courts.as_array().unwrap().iter().map(|a| a["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![COURT, OTHER_COURT]);
}

#[tokio::test]
async fn unknown_role_is_400() {
    let app = test_app().await;
    let (status, resp) = app.get("/api/directory/judge", citizen()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["kind"], "BadRequest");
}

#[tokio::test]
async fn admin_registers_a_new_court() {
    let app = test_app().await;
    let body = json!({ "id": 22, "name": "Family Court", "role": "court" });

    let (status, resp) = app.post_json("/api/directory", body, admin()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        resp,
        json!({ "id": 22, "name": "Family Court", "role": "court", "status": "approved" })
    );

    let (_, courts) = app.get("/api/directory/court", citizen()).await;
    assert_eq!(courts.as_array().unwrap().len(), 3);

    // The new court can now receive cases.
    let case = app.file_case(citizen(), "Custody", &["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();
    app.transition(id, json!({ "status": "under_review" }), station()).await;
    let (status, resp) = app
        .transition(id, json!({ "status": "sent_to_court", "court_id": 22 }), station())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["assigned_court"], 22);
    assert_eq!(resp["court_name"], "Family Court");
}

#[tokio::test]
async fn only_admin_registers() {
    let app = test_app().await;
    let body = json!({ "id": 30, "name": "Rogue Station", "role": "police" });
    for actor in [citizen(), station(), court()] {
        let (status, _) = app.post_json("/api/directory", body.clone(), actor).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{actor}");
    }

    let (status, resp) = app
        .post_json("/api/directory", json!({ "id": 31, "name": " ", "role": "police" }), admin())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["name"].is_string());
}

#[tokio::test]
async fn rejected_court_leaves_the_public_list() {
    let app = test_app().await;
    let uri = format!("/api/directory/accounts/{}", OTHER_COURT);

    let (status, _) = app
        .patch_json(&uri, json!({ "status": "rejected" }), court())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, resp) = app
        .patch_json(&uri, json!({ "status": "rejected" }), admin())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "rejected");

    let (_, courts) = app.get("/api/directory/court", station()).await;
    assert_eq!(courts, json!([{ "id": COURT, "name": "District Court", "role": "court", "status": "approved" }]));
    let (_, all) = app.get("/api/directory/court", admin()).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    // A rejected court cannot be picked.
    let case = app.file_case(citizen(), "Vandalism", &["/a.jpg"]).await;
    let id = case["id"].as_i64().unwrap();
    app.transition(id, json!({ "status": "under_review" }), station()).await;
    let (status, resp) = app
        .transition(id, json!({ "status": "sent_to_court", "court_id": OTHER_COURT }), station())
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["court_id"].is_string());

    // Approving it again restores it.
    let (status, _) = app
        .patch_json(&uri, json!({ "status": "approved" }), admin())
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .transition(id, json!({ "status": "sent_to_court", "court_id": OTHER_COURT }), station())
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleted_station_stops_taking_filings() {
    let app = test_app().await;
    let uri = format!("/api/directory/accounts/{}", STATION);
    let case = app.file_case(citizen(), "Pickpocket", &["/a.jpg"]).await;
    assert_eq!(case["station_name"], "Central Station");

    let (status, _) = app.delete(&uri, station()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.delete(&uri, admin()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&uri, admin()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = json!({
        "station_id": STATION,
        "title": "Second report",
        "incident_date": "2026-09-30",
        "evidence": [{ "file_path": "/b.jpg" }],
    });
    let (status, resp) = app.post_json("/api/cases", body, citizen()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["station_id"].is_string());

    // The existing case keeps its station id; the name is gone.
    let (status, read) = app
        .get(&format!("/api/cases/{}", case["id"]), citizen())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["assigned_station"], STATION);
    assert!(read.get("station_name").is_none());
}

#[tokio::test]
async fn bad_account_id_is_400() {
    let app = test_app().await;
    let (status, _) = app
        .patch_json("/api/directory/accounts/abc", json!({ "status": "approved" }), admin())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
