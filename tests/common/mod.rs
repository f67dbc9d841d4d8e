#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        moodify::db::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        let router = moodify::build_app(pool.clone(), "test-secret");

        Self { router, db: pool }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Send a request with an optional JSON body and bearer token.
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.request(req).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send("GET", uri, None, token).await
    }

    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        self.send("POST", uri, Some(body), token).await
    }

    pub async fn put_json(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        self.send("PUT", uri, Some(body), token).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.send("DELETE", uri, None, token).await
    }

    /// Register a user through the API and return its id.
    pub async fn register(&self, username: &str) -> i64 {
        let resp = self
            .post_json(
                "/api/v1/users/register",
                json!({ "username": username, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_i64().unwrap()
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, username: &str) -> String {
        let resp = self
            .post_json(
                "/api/v1/users/login",
                json!({ "username": username, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await["token"].as_str().unwrap().to_string()
    }

    /// Register and log in, returning `(user_id, token)`.
    pub async fn sign_up(&self, username: &str) -> (i64, String) {
        let id = self.register(username).await;
        let token = self.login(username).await;
        (id, token)
    }

    /// Id of one of the user's tags or categories, looked up by name.
    pub async fn id_of(&self, table: &str, user_id: i64, name: &str) -> i64 {
        let (id,): (i64,) = sqlx::query_as(&format!(
            "SELECT id FROM {table} WHERE user_id = ? AND name = ?"
        ))
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.db)
        .await
        .expect("Failed to look up id by name");
        id
    }

    /// Create an event through the API and return its id.
    pub async fn create_event(&self, token: &str, event: Value) -> i64 {
        let resp = self.post_json("/api/v1/events", event, Some(token)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_i64().unwrap()
    }
}

/// A valid event body; override fields with [`with`].
pub fn event_body(positive: bool, date: i64, tags: &[i64], categories: &[i64]) -> Value {
    json!({
        "name": "Rough meeting",
        "description": "The weekly sync went badly",
        "positive": positive,
        "emotions": ["ANGER"],
        "date": date,
        "tags": tags,
        "categories": categories,
    })
}

pub fn with(mut body: Value, key: &str, value: Value) -> Value {
    body[key] = value;
    body
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp).await).expect("Response body is not JSON")
}
