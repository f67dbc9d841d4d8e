use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::types::Json as SqlJson;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Emotion, Event};
use crate::recommender::Recommender;
use crate::routes::check_length;
use crate::statistics::day_window;
use crate::store::{EventFilter, EventStore};
use crate::AppState;

#[derive(Deserialize)]
pub struct NewEvent {
    name: String,
    description: String,
    positive: bool,
    emotions: Vec<Emotion>,
    date: i64,
    solution: Option<String>,
    tags: Vec<i64>,
    categories: Vec<i64>,
}

/// Partial edit; absent fields keep their stored value.
#[derive(Deserialize, Default)]
pub struct EventChanges {
    name: Option<String>,
    description: Option<String>,
    positive: Option<bool>,
    emotions: Option<Vec<Emotion>>,
    date: Option<i64>,
    solution: Option<String>,
    tags: Option<Vec<i64>>,
    categories: Option<Vec<i64>>,
}

#[derive(Deserialize)]
pub struct EventQuery {
    date: Option<i64>,
    positive: Option<bool>,
}

/// Which join table a link set lives in.
#[derive(Clone, Copy)]
enum Link {
    Tag,
    Category,
}

impl Link {
    fn join_table(self) -> &'static str {
        match self {
            Link::Tag => "event_tags",
            Link::Category => "event_categories",
        }
    }

    fn join_column(self) -> &'static str {
        match self {
            Link::Tag => "tag_id",
            Link::Category => "category_id",
        }
    }

    fn owner_table(self) -> &'static str {
        match self {
            Link::Tag => "tags",
            Link::Category => "categories",
        }
    }
}

fn validate_date(date: i64) -> Result<(), AppError> {
    if date <= 0 {
        return Err(AppError::Validation("\"date\" must be a positive number".to_string()));
    }
    if date > chrono::Utc::now().timestamp_millis() {
        return Err(AppError::Validation("\"date\" must not be in the future".to_string()));
    }
    Ok(())
}

/// A solution is only accepted alongside an explicit `positive: false`.
fn validate_solution(positive: Option<bool>, solution: Option<&str>) -> Result<(), AppError> {
    let Some(solution) = solution else {
        return Ok(());
    };
    if positive != Some(false) {
        return Err(AppError::Validation(
            "\"solution\" is only allowed when \"positive\" is false".to_string(),
        ));
    }
    check_length("solution", solution, 5, 200)
}

fn validate_new_event(event: &NewEvent) -> Result<(), AppError> {
    check_length("name", &event.name, 5, 30)?;
    check_length("description", &event.description, 5, 1000)?;
    validate_date(event.date)?;
    validate_solution(Some(event.positive), event.solution.as_deref())
}

fn validate_changes(changes: &EventChanges) -> Result<(), AppError> {
    if let Some(name) = &changes.name {
        check_length("name", name, 5, 30)?;
    }
    if let Some(description) = &changes.description {
        check_length("description", description, 5, 1000)?;
    }
    if let Some(date) = changes.date {
        validate_date(date)?;
    }
    validate_solution(changes.positive, changes.solution.as_deref())
}

fn unique<T: Ord + Copy>(values: &[T]) -> Vec<T> {
    values.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Fail unless every id in `ids` names a tag or category owned by `user_id`.
async fn ensure_owned(
    conn: &mut SqliteConnection,
    link: Link,
    user_id: i64,
    ids: &[i64],
) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT COUNT(*) FROM {} WHERE user_id = ",
        link.owner_table()
    ));
    query.push_bind(user_id).push(" AND id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    query.push(")");

    let (owned,): (i64,) = query.build_query_as().fetch_one(&mut *conn).await?;
    if owned as usize != ids.len() {
        return Err(AppError::Validation(format!(
            "\"{}\" contains unknown ids",
            link.owner_table()
        )));
    }
    Ok(())
}

/// Drop every existing link of `event_id` in the join table, then insert `ids`.
async fn replace_links(
    conn: &mut SqliteConnection,
    link: Link,
    event_id: i64,
    ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!("DELETE FROM {} WHERE event_id = ?", link.join_table()))
        .bind(event_id)
        .execute(&mut *conn)
        .await?;

    for id in ids {
        sqlx::query(&format!(
            "INSERT INTO {} (event_id, {}) VALUES (?, ?)",
            link.join_table(),
            link.join_column()
        ))
        .bind(event_id)
        .bind(*id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/{id}", get(get_event).put(update_event).delete(delete_event))
        .route("/{id}/suggestedSolution", get(suggested_solution))
}

async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    Json(event): Json<NewEvent>,
) -> Result<impl IntoResponse, AppError> {
    validate_new_event(&event)?;
    let tags = unique(&event.tags);
    let categories = unique(&event.categories);
    let emotions = unique(&event.emotions);
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;
    ensure_owned(&mut *tx, Link::Tag, user.id, &tags).await?;
    ensure_owned(&mut *tx, Link::Category, user.id, &categories).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO events (user_id, name, description, positive, emotions, date, solution, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(&event.name)
    .bind(&event.description)
    .bind(event.positive)
    .bind(SqlJson(&emotions))
    .bind(event.date)
    .bind(&event.solution)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    replace_links(&mut *tx, Link::Tag, id, &tags).await?;
    replace_links(&mut *tx, Link::Category, id, &categories).await?;
    tx.commit().await?;

    tracing::debug!(user_id = user.id, event_id = id, "created event");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_events(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<EventQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let filter = EventFilter {
        date_range: query.date.map(day_window).transpose()?,
        positive: query.positive,
        ..EventFilter::for_user(user.id)
    };
    let events = state.event_store().find_events(&filter).await?;
    Ok(Json(events))
}

async fn get_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Event>, AppError> {
    let event = state.event_store().find_event(user.id, id).await?;
    event.map(Json).ok_or(AppError::NotFound)
}

async fn suggested_solution(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let solutions = Recommender::new(state.event_store())
        .suggest(user.id, id)
        .await?;
    Ok(Json(json!({ "solutions": solutions })))
}

async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(changes): Json<EventChanges>,
) -> Result<Json<Event>, AppError> {
    validate_changes(&changes)?;

    let mut tx = state.db.begin().await?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM events WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user.id)
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_none() {
        return Err(AppError::NotFound);
    }

    let tags = changes.tags.as_deref().map(unique);
    let categories = changes.categories.as_deref().map(unique);
    if let Some(tags) = &tags {
        ensure_owned(&mut *tx, Link::Tag, user.id, tags).await?;
    }
    if let Some(categories) = &categories {
        ensure_owned(&mut *tx, Link::Category, user.id, categories).await?;
    }

    // A positive event never keeps a solution.
    let clear_solution = changes.positive == Some(true);
    let emotions = changes.emotions.as_deref().map(unique).map(SqlJson);
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE events
        SET name = COALESCE(?, name),
            description = COALESCE(?, description),
            positive = COALESCE(?, positive),
            emotions = COALESCE(?, emotions),
            date = COALESCE(?, date),
            solution = CASE WHEN ? THEN NULL ELSE COALESCE(?, solution) END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.positive)
    .bind(emotions)
    .bind(changes.date)
    .bind(clear_solution)
    .bind(&changes.solution)
    .bind(&now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if let Some(tags) = &tags {
        replace_links(&mut *tx, Link::Tag, id, tags).await?;
    }
    if let Some(categories) = &categories {
        replace_links(&mut *tx, Link::Category, id, categories).await?;
    }
    tx.commit().await?;

    let event = state.event_store().find_event(user.id, id).await?;
    event.map(Json).ok_or(AppError::NotFound)
}

async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM events WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
