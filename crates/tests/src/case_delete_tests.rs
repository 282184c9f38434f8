use std::sync::Arc;

use axum::http::StatusCode;
use server::analysis::StaticAnalyzer;
use shared_types::Actor;
use tokio::sync::Semaphore;

use crate::common::*;

#[tokio::test]
async fn filer_deletes_case_and_evidence() {
    let app = test_app().await;
    let case = app.file_case(citizen(), "Mistaken report", &["/a.jpg", "/b.mp4"]).await;
    let id = case["id"].as_i64().unwrap();
    let evidence = evidence_ids(&case);

    let (status, body) = app.delete(&format!("/api/cases/{id}"), citizen()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.get(&format!("/api/cases/{id}"), citizen()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    for evidence_id in evidence {
        let (status, _) = app.get(&format!("/api/evidence/{evidence_id}"), admin()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // The filing notice outlives the case.
    let (_, notifications) = app.get("/api/notifications", citizen()).await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_the_filer_may_delete() {
    let app = test_app().await;
    let case = app.file_case(citizen(), "Keep me", &["/a.jpg"]).await;
    let uri = format!("/api/cases/{}", case["id"]);

    for actor in [Actor::citizen(OTHER_CITIZEN), station(), court(), admin()] {
        let (status, resp) = app.delete(&uri, actor).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{actor}");
        assert_eq!(resp["kind"], "Unauthorized");
    }

    let (status, _) = app.get(&uri, citizen()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_missing_case_is_404() {
    let app = test_app().await;
    let (status, _) = app.delete("/api/cases/77", citizen()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_during_analysis_discards_the_result() {
    let gate = Arc::new(Semaphore::new(0));
    let analyzer = Arc::new(StaticAnalyzer::verdict(true, 50.0).with_gate(gate.clone()));
    let app = test_app_with(analyzer, None).await;

    let case = app.case_at_court(&["/a.jpg"]).await;
    let evidence_id = evidence_ids(&case)[0];
    let mut outcomes = app.core.subscribe_analysis();

    let (status, _) = app
        .post_empty(&format!("/api/evidence/{evidence_id}/analyze"), court())
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = app.delete(&format!("/api/cases/{}", case["id"]), citizen()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    gate.add_permits(1);
    // Nothing is published for a discarded result.
    let waited = tokio::time::timeout(std::time::Duration::from_millis(200), outcomes.recv()).await;
    assert!(waited.is_err());

    let (status, _) = app.get(&format!("/api/evidence/{evidence_id}"), admin()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
