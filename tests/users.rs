mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn register_then_login_returns_token() {
    let app = TestApp::new().await;
    app.register("moodyuser").await;

    let resp = app
        .post_json(
            "/api/v1/users/login",
            json!({ "username": "moodyuser", "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn register_populates_default_categories_and_tags() {
    let app = TestApp::new().await;
    let (_, token) = app.sign_up("moodyuser").await;

    let categories = body_json(app.get("/api/v1/categories", Some(&token)).await).await;
    let names: Vec<&str> = categories
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Interpersonal", "Personal", "Professional", "Daily Life"]);

    let tags = body_json(app.get("/api/v1/tags", Some(&token)).await).await;
    let tags = tags.as_array().unwrap();
    assert_eq!(tags.len(), 14);
    let places = tags.iter().filter(|t| t["type"] == "PLACE").count();
    assert_eq!(places, 3);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = TestApp::new().await;
    app.register("moodyuser").await;

    let resp = app
        .post_json(
            "/api/v1/users/register",
            json!({ "username": "moodyuser", "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = TestApp::new().await;

    let resp = app
        .post_json(
            "/api/v1/users/register",
            json!({ "username": "moodyuser", "password": "short" }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.register("moodyuser").await;

    let resp = app
        .post_json(
            "/api/v1/users/login",
            json!({ "username": "moodyuser", "password": "not the password" }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_user_is_unauthorized() {
    let app = TestApp::new().await;

    let resp = app
        .post_json(
            "/api/v1/users/login",
            json!({ "username": "nobody-here", "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let resp = app.get("/api/v1/events", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.get("/api/v1/events", Some("not-a-jwt")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn welcome_and_health_are_public() {
    let app = TestApp::new().await;

    let resp = app.get("/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.get("/api/v1", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("moodify"));
}
