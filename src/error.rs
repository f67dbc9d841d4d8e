use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Database(sqlx::Error),
    PasswordHash(argon2::password_hash::Error),
    Token(jsonwebtoken::errors::Error),
    Validation(String),
    Conflict(String),
    Unauthorized,
    NotFound,
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "database error: {e}"),
            AppError::PasswordHash(e) => write!(f, "password hash error: {e}"),
            AppError::Token(e) => write!(f, "token error: {e}"),
            AppError::Validation(msg) => write!(f, "{msg}"),
            AppError::Conflict(msg) => write!(f, "{msg}"),
            AppError::Unauthorized => write!(f, "Invalid credentials"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

impl std::error::Error for AppError {}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => message(StatusCode::NOT_FOUND, "Not found"),
            AppError::Unauthorized => message(StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AppError::Validation(msg) => message(StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => message(StatusCode::CONFLICT, msg),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::PasswordHash(e) => {
                tracing::error!("Password hash error: {e}");
                message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Token(e) => {
                tracing::error!("Token error: {e}");
                message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(e)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Token(e)
    }
}
