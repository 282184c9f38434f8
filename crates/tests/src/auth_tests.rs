use axum::body::Body;
use axum::http::{Request, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use pretty_assertions::assert_eq;
use server::auth::Claims;

use crate::common::*;

fn signed(claims: &Claims, secret: &[u8]) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret)).unwrap()
}

fn claims(role: &str, typ: &str, exp_offset_secs: i64) -> Claims {
    let now = chrono::Utc::now().timestamp();
    Claims {
        sub: CITIZEN,
        role: role.to_string(),
        exp: now + exp_offset_secs,
        iat: now,
        jti: None,
        typ: typ.to_string(),
    }
}

#[tokio::test]
async fn missing_token_is_401() {
    let app = test_app().await;
    for uri in ["/api/cases", "/api/notifications", "/api/stats", "/api/directory/court"] {
        let (status, resp) = app.get_anonymous(uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(resp["kind"], "Unauthorized");
        assert_eq!(resp["message"], "Authentication required");
    }
}

#[tokio::test]
async fn bad_tokens_are_401() {
    let app = test_app().await;
    let tokens = [
        "garbage".to_string(),
        signed(&claims("citizen", "access", 3600), b"some-other-secret"),
        signed(&claims("citizen", "access", -3600), JWT_SECRET),
        signed(&claims("citizen", "refresh", 3600), JWT_SECRET),
    ];
    for token in tokens {
        let (status, _) = app.get_with_token("/api/cases", &token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn unknown_role_claim_is_401() {
    let app = test_app().await;
    let token = signed(&claims("judge", "access", 3600), JWT_SECRET);
    let (status, resp) = app.get_with_token("/api/cases", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["message"], "Unknown role 'judge'");
}

#[tokio::test]
async fn legacy_role_spelling_is_accepted() {
    let app = test_app().await;
    let token = signed(&claims("user", "access", 3600), JWT_SECRET);
    let (status, resp) = app.get_with_token("/api/stats", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["scope"], "citizen");
}

#[tokio::test]
async fn health_and_docs_are_public() {
    let app = test_app().await;
    let (status, resp) = app.get_anonymous("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["storage"], "connected");

    let req = Request::builder().uri("/docs").body(Body::empty()).unwrap();
    let (status, _) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = test_app().await;
    let req = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), req).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), req).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
