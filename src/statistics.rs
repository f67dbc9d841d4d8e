//! Mood scores over a user's events.
//!
//! Every positive event is worth 5 points and every negative one 1 point.
//! Tag scores are the mean over the tag's events, day scores are the sum over
//! the day's events.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{Event, Tag, TagType};
use crate::store::{EventFilter, EventStore};

pub const POSITIVE_POINTS: i64 = 5;
pub const NEGATIVE_POINTS: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagScore {
    pub tag: Tag,
    pub score: f64,
}

pub fn mood_points(event: &Event) -> i64 {
    if event.positive {
        POSITIVE_POINTS
    } else {
        NEGATIVE_POINTS
    }
}

/// Mean points per event, 0 for no events.
pub fn mean_score(events: &[Event]) -> f64 {
    if events.is_empty() {
        return 0.0;
    }
    let total: i64 = events.iter().map(mood_points).sum();
    total as f64 / events.len() as f64
}

pub fn total_score(events: &[Event]) -> i64 {
    events.iter().map(mood_points).sum()
}

/// `[midnight, midnight + 24h]` in epoch milliseconds for the UTC day
/// containing `date_ms`. Both ends are inclusive.
pub fn day_window(date_ms: i64) -> Result<(i64, i64), AppError> {
    let out_of_range = || AppError::Validation("date is out of range".to_string());
    let date: DateTime<Utc> = Utc.timestamp_millis_opt(date_ms).single().ok_or_else(out_of_range)?;
    let midnight = date.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
    let next_midnight = midnight
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(out_of_range)?;
    Ok((midnight.timestamp_millis(), next_midnight.timestamp_millis()))
}

pub struct Aggregator<S> {
    store: S,
}

impl<S: EventStore> Aggregator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Mean score of every tag of `tag_type` owned by the user.
    pub async fn score_by_tag_type(&self, user_id: i64, tag_type: TagType) -> Result<Vec<TagScore>, AppError> {
        let tags = self.store.find_tags(user_id, Some(tag_type)).await?;

        let mut scores = Vec::with_capacity(tags.len());
        for tag in tags {
            let filter = EventFilter {
                tag_ids_any: Some(vec![tag.id]),
                ..EventFilter::for_user(user_id)
            };
            let events = self.store.find_events(&filter).await?;
            scores.push(TagScore {
                score: mean_score(&events),
                tag,
            });
        }

        tracing::debug!(user_id, %tag_type, tags = scores.len(), "scored tags");
        Ok(scores)
    }

    /// Summed score of the events on the UTC day containing `date_ms`.
    pub async fn score_of_day(&self, user_id: i64, date_ms: i64) -> Result<i64, AppError> {
        let filter = EventFilter {
            date_range: Some(day_window(date_ms)?),
            ..EventFilter::for_user(user_id)
        };
        let events = self.store.find_events(&filter).await?;
        Ok(total_score(&events))
    }
}
