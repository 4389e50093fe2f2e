use axum::{body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

#[tokio::test]
async fn livez_healthy_and_admin_requires_auth() {
    let state = jx_api::test_state("test-secret");
    let app = jx_api::create_router(state);

    let livez_response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/livez")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(livez_response.status(), StatusCode::OK);

    let unauthorized = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_malformed_email_before_touching_storage() {
    let state = jx_api::test_state("test-secret");
    let app = jx_api::create_router(state);

    let payload = serde_json::json!({
        "email": "not-an-email",
        "password": "hunter2!",
        "confirm_password": "hunter2!",
        "full_name": "Test User",
        "role": "Applicant",
        "verify_key": "1234567890",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_rejects_garbage_access_token() {
    let state = jx_api::test_state("test-secret");
    let app = jx_api::create_router(state);

    let payload = serde_json::json!({
        "access_token": "not.a.jwt",
        "refresh_token": "nor-a-refresh-token",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/refresh")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_catalogue_degrades_to_an_empty_page_without_a_database() {
    let state = jx_api::test_state("test-secret");
    let app = jx_api::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/jobs?page=1&page_size=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let page: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(page["items"], serde_json::json!([]));
    assert_eq!(page["total_items"], 0);
    assert_eq!(page["page"], 1);
    assert_eq!(page["page_size"], 5);
}
