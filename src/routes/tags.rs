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
use crate::models::{Tag, TagType};
use crate::routes::{check_length, is_unique_violation};
use crate::AppState;

#[derive(Deserialize)]
pub struct NewTag {
    name: String,
    #[serde(rename = "type", default)]
    tag_type: TagType,
}

#[derive(Deserialize)]
pub struct TagChanges {
    name: Option<String>,
    #[serde(rename = "type")]
    tag_type: Option<TagType>,
}

fn duplicate_name(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict("Tag already exists for this user".to_string())
    } else {
        AppError::Database(e)
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{id}", get(get_tag).put(update_tag).delete(delete_tag))
}

async fn fetch_tag(db: &sqlx::SqlitePool, user_id: i64, id: i64) -> Result<Tag, AppError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    tag.ok_or(AppError::NotFound)
}

async fn create_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewTag>,
) -> Result<impl IntoResponse, AppError> {
    check_length("name", &body.name, 2, 30)?;

    let now = chrono::Utc::now().to_rfc3339();
    let tag: Tag = sqlx::query_as(
        "INSERT INTO tags (user_id, name, type, created_at) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(user.id)
    .bind(&body.name)
    .bind(body.tag_type)
    .bind(&now)
    .fetch_one(&state.db)
    .await
    .map_err(duplicate_name)?;

    Ok((StatusCode::CREATED, Json(tag)))
}

async fn list_tags(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Tag>>, AppError> {
    let tags: Vec<Tag> = sqlx::query_as("SELECT * FROM tags WHERE user_id = ? ORDER BY id")
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(tags))
}

async fn get_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Tag>, AppError> {
    Ok(Json(fetch_tag(&state.db, user.id, id).await?))
}

async fn update_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(changes): Json<TagChanges>,
) -> Result<Json<Tag>, AppError> {
    if let Some(name) = &changes.name {
        check_length("name", name, 2, 30)?;
    }
    fetch_tag(&state.db, user.id, id).await?;

    let tag: Tag = sqlx::query_as(
        r#"
        UPDATE tags
        SET name = COALESCE(?, name), type = COALESCE(?, type)
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(&changes.name)
    .bind(changes.tag_type)
    .bind(id)
    .bind(user.id)
    .fetch_one(&state.db)
    .await
    .map_err(duplicate_name)?;

    Ok(Json(tag))
}

async fn delete_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
