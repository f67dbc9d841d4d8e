use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::Category;
use crate::routes::{check_length, is_unique_violation};
use crate::AppState;

#[derive(Deserialize)]
pub struct CategoryBody {
    name: String,
}

fn duplicate_name(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict("The user already has a category with the given name".to_string())
    } else {
        AppError::Database(e)
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn fetch_category(db: &sqlx::SqlitePool, user_id: i64, id: i64) -> Result<Category, AppError> {
    let category: Option<Category> =
        sqlx::query_as("SELECT * FROM categories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    category.ok_or(AppError::NotFound)
}

async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CategoryBody>,
) -> Result<impl IntoResponse, AppError> {
    check_length("name", &body.name, 5, 30)?;

    let now = chrono::Utc::now().to_rfc3339();
    let category: Category = sqlx::query_as(
        "INSERT INTO categories (user_id, name, created_at) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(user.id)
    .bind(&body.name)
    .bind(&now)
    .fetch_one(&state.db)
    .await
    .map_err(duplicate_name)?;

    Ok((StatusCode::CREATED, Json(category)))
}

async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories: Vec<Category> =
        sqlx::query_as("SELECT * FROM categories WHERE user_id = ? ORDER BY id")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;
    Ok(Json(categories))
}

async fn get_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(fetch_category(&state.db, user.id, id).await?))
}

async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<Category>, AppError> {
    check_length("name", &body.name, 5, 30)?;
    fetch_category(&state.db, user.id, id).await?;

    let category: Category =
        sqlx::query_as("UPDATE categories SET name = ? WHERE id = ? AND user_id = ? RETURNING *")
            .bind(&body.name)
            .bind(id)
            .bind(user.id)
            .fetch_one(&state.db)
            .await
            .map_err(duplicate_name)?;

    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
