use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::TagType;
use crate::statistics::{Aggregator, TagScore};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagTypeQuery {
    tag_type: TagType,
}

#[derive(Deserialize)]
pub struct DayQuery {
    date: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scores_by_tag_type))
        .route("/day", get(score_of_day))
}

async fn scores_by_tag_type(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TagTypeQuery>,
) -> Result<Json<Vec<TagScore>>, AppError> {
    let scores = Aggregator::new(state.event_store())
        .score_by_tag_type(user.id, query.tag_type)
        .await?;
    Ok(Json(scores))
}

async fn score_of_day(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let score = Aggregator::new(state.event_store())
        .score_of_day(user.id, query.date)
        .await?;
    Ok(Json(json!({ "score": score })))
}
