use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Grouping used by the tag statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum TagType {
    #[serde(rename = "PLACE")]
    #[sqlx(rename = "PLACE")]
    Place,
    #[serde(rename = "ACTIVITY")]
    #[sqlx(rename = "ACTIVITY")]
    Activity,
    #[default]
    #[serde(rename = "OTHER")]
    #[sqlx(rename = "OTHER")]
    Other,
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagType::Place => write!(f, "PLACE"),
            TagType::Activity => write!(f, "ACTIVITY"),
            TagType::Other => write!(f, "OTHER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub tag_type: TagType,
    pub created_at: String,
}
