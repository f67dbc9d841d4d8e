use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{create_token, hash_password, verify_password};
use crate::defaults;
use crate::error::AppError;
use crate::models::User;
use crate::routes::{check_length, is_unique_violation};
use crate::AppState;

#[derive(Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

fn validate_credentials(credentials: &Credentials) -> Result<(), AppError> {
    check_length("username", &credentials.username, 5, 30)?;
    check_length("password", &credentials.password, 8, 500)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    validate_credentials(&credentials)?;

    let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(&credentials.username)
        .fetch_optional(&state.db)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("Username taken".to_string()));
    }

    let password_hash = hash_password(&credentials.password)?;
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;

    let user_id = sqlx::query("INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)")
        .bind(&credentials.username)
        .bind(&password_hash)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Username taken".to_string())
            } else {
                AppError::Database(e)
            }
        })?
        .last_insert_rowid();

    defaults::populate(&mut *tx, user_id, &now).await?;
    tx.commit().await?;

    tracing::info!(user_id, username = %credentials.username, "registered user");
    Ok((StatusCode::CREATED, Json(json!({ "id": user_id }))))
}

async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    validate_credentials(&credentials)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(&credentials.username)
        .fetch_optional(&state.db)
        .await?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized);
    };
    if !verify_password(&credentials.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let token = create_token(&state.jwt_secret, &user)?;
    Ok(Json(json!({ "token": token })))
}
