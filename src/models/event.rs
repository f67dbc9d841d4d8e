use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Emotion {
    Joy,
    Gratitude,
    Calm,
    Love,
    Pride,
    Sadness,
    Anger,
    Fear,
    Anxiety,
    Disgust,
    Surprise,
    Loneliness,
    Shame,
    Stress,
}

/// A logged mood entry together with its resolved tag and category ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub positive: bool,
    pub emotions: Vec<Emotion>,
    /// Milliseconds since the Unix epoch.
    pub date: i64,
    pub solution: Option<String>,
    pub tags: Vec<i64>,
    pub categories: Vec<i64>,
    pub created_at: String,
    pub updated_at: String,
}
