pub mod auth;
pub mod config;
pub mod db;
pub mod defaults;
pub mod error;
pub mod models;
pub mod recommender;
pub mod routes;
pub mod statistics;
pub mod store;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::store::SqliteEventStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn event_store(&self) -> SqliteEventStore {
        SqliteEventStore::new(self.db.clone())
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the moodify API! There is no public API documentation yet."
    }))
}

/// Build the full Axum application router.
///
/// Caller is responsible for running database migrations on `pool` beforehand.
pub fn build_app(pool: SqlitePool, jwt_secret: impl Into<Arc<str>>) -> Router {
    let state = AppState {
        db: pool,
        jwt_secret: jwt_secret.into(),
    };

    let api = Router::new()
        .route("/", get(welcome))
        .nest("/users", routes::users::router())
        .nest("/categories", routes::categories::router())
        .nest("/tags", routes::tags::router())
        .nest("/events", routes::events::router())
        .nest("/statistics", routes::statistics::router());

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
