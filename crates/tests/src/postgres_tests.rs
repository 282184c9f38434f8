//! Runs the HTTP stack over Postgres. Skipped unless `TEST_DATABASE_URL` is set.

use std::sync::Arc;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use server::analysis::StaticAnalyzer;
use server::storage::PgStore;
use sqlx::{Pool, Postgres};
use tokio::sync::Mutex;

use crate::common::*;

/// Tests share one database, so they run one at a time.
static TEST_MUTEX: std::sync::LazyLock<Mutex<()>> = std::sync::LazyLock::new(|| Mutex::new(()));

async fn pg_app() -> Option<(TestApp, Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>)> {
    let _ = dotenvy::dotenv();
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping postgres test");
        return None;
    };

    let guard = TEST_MUTEX.lock().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    server::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("TRUNCATE notifications, evidence, cases, accounts RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to truncate");

    let app = build_app(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(StaticAnalyzer::verdict(false, 92.3)),
        None,
    )
    .await;

    Some((app, pool, guard))
}

#[tokio::test]
async fn pg_case_reaches_court_with_notifications() {
    let Some((app, _pool, _guard)) = pg_app().await else {
        return;
    };

    let case = app.case_at_court(&["/uploads/a.jpg", "/uploads/b.mp4"]).await;
    assert_eq!(case["status"], "sent_to_court");
    assert_eq!(case["assigned_court"], COURT);
    assert_eq!(case["evidence"].as_array().unwrap().len(), 2);

    let (_, notifications) = app.get("/api/notifications", citizen()).await;
    assert_eq!(notifications.as_array().unwrap().len(), 2);
    assert_eq!(notifications[0]["type"], "sent_to_court");

    let (status, resp) = app
        .transition(case["id"].as_i64().unwrap(), json!({ "status": "approved" }), station())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{resp}");
}

#[tokio::test]
async fn pg_analysis_completes() {
    let Some((app, _pool, _guard)) = pg_app().await else {
        return;
    };

    let case = app.case_at_court(&["/uploads/a.jpg"]).await;
    let evidence_id = evidence_ids(&case)[0];

    let (status, _) = app
        .post_empty(&format!("/api/evidence/{evidence_id}/analyze"), court())
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let evidence = app.wait_for_analysis(evidence_id, court()).await;
    assert_eq!(evidence["analysis_status"], "completed");
    assert_eq!(evidence["is_authentic"], false);
    assert_eq!(evidence["confidence_score"], 92.3);
}

#[tokio::test]
async fn pg_delete_cascades_to_evidence() {
    let Some((app, pool, _guard)) = pg_app().await else {
        return;
    };

    let case = app.file_case(citizen(), "Cascade", &["/a.jpg", "/b.jpg"]).await;
    let (status, _) = app
        .delete(&format!("/api/cases/{}", case["id"]), citizen())
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM evidence")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let notices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(notices, 1);
}

#[tokio::test]
async fn pg_stats_and_directory() {
    let Some((app, _pool, _guard)) = pg_app().await else {
        return;
    };

    app.file_case(citizen(), "Counted", &["/a.jpg"]).await;

    let (_, stats) = app.get("/api/stats", admin()).await;
    assert_eq!(stats["total_cases"], 1);
    assert_eq!(stats["cases_by_status"]["pending"], 1);
    assert_eq!(stats["accounts_by_role"]["police"], 2);

    let (_, courts) = app.get("/api/directory/court", citizen()).await;
    assert_eq!(courts.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn pg_directory_review_and_case_names() {
    let Some((app, _pool, _guard)) = pg_app().await else {
        return;
    };

    let case = app.case_at_court(&["/uploads/a.jpg"]).await;
    assert_eq!(case["station_name"], "Central Station");
    assert_eq!(case["court_name"], "District Court");

    let (status, resp) = app
        .patch_json(
            &format!("/api/directory/accounts/{}", OTHER_COURT),
            json!({ "status": "rejected" }),
            admin(),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["status"], "rejected");

    let (_, courts) = app.get("/api/directory/court", citizen()).await;
    assert_eq!(courts.as_array().unwrap().len(), 1);

    let (status, _) = app
        .delete(&format!("/api/directory/accounts/{}", COURT), admin())
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, read) = app.get(&format!("/api/cases/{}", case["id"]), citizen()).await;
    assert_eq!(read["assigned_court"], COURT);
    assert!(read.get("court_name").is_none());
}
