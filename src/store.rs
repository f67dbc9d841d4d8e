//! Read access to a user's events, tags and categories.
//!
//! The recommender and the statistics aggregator only ever see the
//! [`EventStore`] trait, so they can be exercised against any backing store.
//! [`SqliteEventStore`] is the implementation used by the HTTP layer.

use std::collections::HashMap;
use std::future::Future;

use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::models::{Emotion, Event, Tag, TagType};

/// Criteria for [`EventStore::find_events`]. Every criterion is AND-ed; the
/// id lists inside a criterion are OR-ed.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub user_id: i64,
    /// Event must link at least one of these categories.
    pub category_ids_any: Option<Vec<i64>>,
    /// Event must link at least one of these tags.
    pub tag_ids_any: Option<Vec<i64>>,
    pub solution_not_null: bool,
    /// Inclusive bounds, epoch milliseconds.
    pub date_range: Option<(i64, i64)>,
    pub positive: Option<bool>,
    pub exclude_event_id: Option<i64>,
}

impl EventFilter {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// An `Some(vec![])` id list can never match.
    fn is_unsatisfiable(&self) -> bool {
        matches!(&self.category_ids_any, Some(ids) if ids.is_empty())
            || matches!(&self.tag_ids_any, Some(ids) if ids.is_empty())
    }
}

pub trait EventStore {
    fn find_event(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> impl Future<Output = Result<Option<Event>, sqlx::Error>> + Send;

    /// Matching events ordered by date, then id, both ascending.
    fn find_events(
        &self,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<Vec<Event>, sqlx::Error>> + Send;

    fn find_tags(
        &self,
        user_id: i64,
        tag_type: Option<TagType>,
    ) -> impl Future<Output = Result<Vec<Tag>, sqlx::Error>> + Send;
}

/// Row shape of the `events` table, before tag and category ids are attached.
#[derive(FromRow)]
struct EventRow {
    id: i64,
    user_id: i64,
    name: String,
    description: String,
    positive: bool,
    emotions: Json<Vec<Emotion>>,
    date: i64,
    solution: Option<String>,
    created_at: String,
    updated_at: String,
}

impl EventRow {
    fn into_event(self, tags: Vec<i64>, categories: Vec<i64>) -> Event {
        Event {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            positive: self.positive,
            emotions: self.emotions.0,
            date: self.date,
            solution: self.solution,
            tags,
            categories,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const EVENT_COLUMNS: &str = "e.id, e.user_id, e.name, e.description, e.positive, e.emotions, \
     e.date, e.solution, e.created_at, e.updated_at";

#[derive(Clone)]
pub struct SqliteEventStore {
    db: SqlitePool,
}

impl SqliteEventStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Load `(event_id, linked_id)` pairs from a join table for the given events.
    async fn links(
        &self,
        table: &str,
        column: &str,
        event_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<i64>>, sqlx::Error> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT event_id, {column} FROM {table} WHERE event_id IN ("
        ));
        let mut ids = query.separated(", ");
        for id in event_ids {
            ids.push_bind(*id);
        }
        query.push(format!(") ORDER BY event_id, {column}"));

        let pairs: Vec<(i64, i64)> = query.build_query_as().fetch_all(&self.db).await?;

        let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
        for (event_id, linked_id) in pairs {
            links.entry(event_id).or_default().push(linked_id);
        }
        Ok(links)
    }

    async fn attach_links(&self, rows: Vec<EventRow>) -> Result<Vec<Event>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let event_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut tags = self.links("event_tags", "tag_id", &event_ids).await?;
        let mut categories = self
            .links("event_categories", "category_id", &event_ids)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                row.into_event(
                    tags.remove(&id).unwrap_or_default(),
                    categories.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }
}

impl EventStore for SqliteEventStore {
    async fn find_event(&self, user_id: i64, event_id: i64) -> Result<Option<Event>, sqlx::Error> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ? AND e.user_id = ?"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(self.attach_links(vec![row]).await?.pop())
    }

    async fn find_events(&self, filter: &EventFilter) -> Result<Vec<Event>, sqlx::Error> {
        if filter.is_unsatisfiable() {
            return Ok(vec![]);
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.user_id = "));
        query.push_bind(filter.user_id);

        if filter.solution_not_null {
            query.push(" AND e.solution IS NOT NULL");
        }
        if let Some(positive) = filter.positive {
            query.push(" AND e.positive = ").push_bind(positive);
        }
        if let Some((from, to)) = filter.date_range {
            query
                .push(" AND e.date >= ")
                .push_bind(from)
                .push(" AND e.date <= ")
                .push_bind(to);
        }
        if let Some(excluded) = filter.exclude_event_id {
            query.push(" AND e.id <> ").push_bind(excluded);
        }
        if let Some(category_ids) = &filter.category_ids_any {
            query.push(
                " AND EXISTS (SELECT 1 FROM event_categories ec \
                 WHERE ec.event_id = e.id AND ec.category_id IN (",
            );
            let mut ids = query.separated(", ");
            for id in category_ids {
                ids.push_bind(*id);
            }
            query.push("))");
        }
        if let Some(tag_ids) = &filter.tag_ids_any {
            query.push(
                " AND EXISTS (SELECT 1 FROM event_tags et \
                 WHERE et.event_id = e.id AND et.tag_id IN (",
            );
            let mut ids = query.separated(", ");
            for id in tag_ids {
                ids.push_bind(*id);
            }
            query.push("))");
        }
        query.push(" ORDER BY e.date ASC, e.id ASC");

        let rows: Vec<EventRow> = query.build_query_as().fetch_all(&self.db).await?;
        tracing::debug!(user_id = filter.user_id, count = rows.len(), "loaded events");

        self.attach_links(rows).await
    }

    async fn find_tags(&self, user_id: i64, tag_type: Option<TagType>) -> Result<Vec<Tag>, sqlx::Error> {
        match tag_type {
            Some(tag_type) => {
                sqlx::query_as("SELECT * FROM tags WHERE user_id = ? AND type = ? ORDER BY id")
                    .bind(user_id)
                    .bind(tag_type)
                    .fetch_all(&self.db)
                    .await
            }
            None => {
                sqlx::query_as("SELECT * FROM tags WHERE user_id = ? ORDER BY id")
                    .bind(user_id)
                    .fetch_all(&self.db)
                    .await
            }
        }
    }
}
