//! Suggested solutions for a negative event.
//!
//! Past events that share at least one category with the target and carry a
//! solution are ranked by how much they resemble it. Shared tags count twice as
//! much as shared emotions.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::error::AppError;
use crate::models::{Emotion, Event};
use crate::store::{EventFilter, EventStore};

/// Number of solutions returned by [`Recommender::suggest`].
pub const MAX_SUGGESTIONS: usize = 3;

const TAG_WEIGHT: usize = 2;
const EMOTION_WEIGHT: usize = 1;

/// Similarity of `candidate` to `target`.
pub fn similarity(target: &Event, candidate: &Event) -> usize {
    let target_tags: HashSet<i64> = target.tags.iter().copied().collect();
    let candidate_tags: HashSet<i64> = candidate.tags.iter().copied().collect();
    let target_emotions: HashSet<Emotion> = target.emotions.iter().copied().collect();
    let candidate_emotions: HashSet<Emotion> = candidate.emotions.iter().copied().collect();

    TAG_WEIGHT * target_tags.intersection(&candidate_tags).count()
        + EMOTION_WEIGHT * target_emotions.intersection(&candidate_emotions).count()
}

/// Order candidates best first: highest similarity, then most recent date,
/// then highest id.
pub fn rank<'a>(target: &Event, candidates: &'a [Event]) -> Vec<&'a Event> {
    let mut ranked: Vec<(usize, &Event)> = candidates
        .iter()
        .map(|candidate| (similarity(target, candidate), candidate))
        .collect();
    ranked.sort_by_key(|(score, event)| (Reverse(*score), Reverse(event.date), Reverse(event.id)));
    ranked.into_iter().map(|(_, event)| event).collect()
}

pub struct Recommender<S> {
    store: S,
}

impl<S: EventStore> Recommender<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Solutions of the past events most similar to `event_id`.
    ///
    /// Returns `Ok(None)` when no other solved event shares a category with the
    /// target, and `Err(AppError::NotFound)` when the target does not exist or
    /// belongs to someone else.
    pub async fn suggest(&self, user_id: i64, event_id: i64) -> Result<Option<Vec<String>>, AppError> {
        let Some(target) = self.store.find_event(user_id, event_id).await? else {
            return Err(AppError::NotFound);
        };

        let filter = EventFilter {
            category_ids_any: Some(target.categories.clone()),
            solution_not_null: true,
            exclude_event_id: Some(target.id),
            ..EventFilter::for_user(user_id)
        };
        let candidates = self.store.find_events(&filter).await?;

        if candidates.is_empty() {
            tracing::debug!(user_id, event_id, "no solved events share a category");
            return Ok(None);
        }

        let solutions: Vec<String> = rank(&target, &candidates)
            .into_iter()
            .filter_map(|event| event.solution.clone())
            .take(MAX_SUGGESTIONS)
            .collect();

        tracing::debug!(
            user_id,
            event_id,
            candidates = candidates.len(),
            returned = solutions.len(),
            "suggested solutions"
        );
        Ok(Some(solutions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{event, MemoryEventStore};

    const USER: i64 = 1;

    fn solved(id: i64, categories: &[i64], tags: &[i64], emotions: &[Emotion], solution: &str) -> Event {
        Event {
            categories: categories.to_vec(),
            tags: tags.to_vec(),
            emotions: emotions.to_vec(),
            solution: Some(solution.to_string()),
            ..event(id, USER)
        }
    }

    fn target(categories: &[i64], tags: &[i64], emotions: &[Emotion]) -> Event {
        Event {
            categories: categories.to_vec(),
            tags: tags.to_vec(),
            emotions: emotions.to_vec(),
            ..event(100, USER)
        }
    }

    #[test]
    fn similarity_weights_tags_twice_as_much_as_emotions() {
        let target = target(&[1, 2], &[1, 2], &[Emotion::Joy, Emotion::Fear]);
        let x = solved(1, &[2], &[1], &[Emotion::Joy], "go for a walk");
        let y = solved(2, &[1], &[], &[Emotion::Fear], "call a friend");

        assert_eq!(similarity(&target, &x), 3);
        assert_eq!(similarity(&target, &y), 1);
    }

    #[test]
    fn similarity_ignores_duplicate_emotions() {
        let target = target(&[1], &[], &[Emotion::Anger]);
        let candidate = solved(1, &[1], &[], &[Emotion::Anger, Emotion::Anger], "count to ten");

        assert_eq!(similarity(&target, &candidate), 1);
    }

    #[test]
    fn rank_breaks_ties_by_most_recent_date() {
        let target = target(&[1], &[5], &[]);
        let older = Event { date: 1_000, ..solved(1, &[1], &[5], &[], "older") };
        let newer = Event { date: 2_000, ..solved(2, &[1], &[5], &[], "newer") };
        let candidates = vec![older, newer];

        let ranked: Vec<i64> = rank(&target, &candidates).iter().map(|e| e.id).collect();
        assert_eq!(ranked, vec![2, 1]);
    }

    #[test]
    fn higher_tag_overlap_ranks_first_with_equal_emotions() {
        let target = target(&[1], &[1, 2], &[Emotion::Sadness]);
        let one_tag = solved(1, &[1], &[1], &[Emotion::Sadness], "one");
        let two_tags = solved(2, &[1], &[1, 2], &[Emotion::Sadness], "two");
        let candidates = vec![two_tags, one_tag];

        let ranked: Vec<i64> = rank(&target, &candidates).iter().map(|e| e.id).collect();
        assert_eq!(ranked, vec![2, 1]);
    }

    #[tokio::test]
    async fn suggests_solutions_in_similarity_order() {
        let store = MemoryEventStore {
            events: vec![
                target(&[1, 2], &[1, 2], &[Emotion::Joy, Emotion::Fear]),
                solved(1, &[2], &[1], &[Emotion::Joy], "go for a walk"),
                solved(2, &[1], &[], &[Emotion::Fear], "call a friend"),
            ],
            ..Default::default()
        };

        let solutions = Recommender::new(store).suggest(USER, 100).await.unwrap();
        assert_eq!(
            solutions,
            Some(vec!["go for a walk".to_string(), "call a friend".to_string()])
        );
    }

    #[tokio::test]
    async fn returns_at_most_three_solutions_from_shared_categories() {
        let mut events = vec![target(&[1], &[1], &[Emotion::Stress])];
        for id in 1..=5 {
            events.push(solved(id, &[1], &[1], &[], &format!("solution {id}")));
        }
        events.push(solved(6, &[9], &[1], &[Emotion::Stress], "unrelated category"));
        let store = MemoryEventStore { events, ..Default::default() };

        let solutions = Recommender::new(store).suggest(USER, 100).await.unwrap().unwrap();
        assert_eq!(solutions.len(), MAX_SUGGESTIONS);
        assert!(!solutions.contains(&"unrelated category".to_string()));
    }

    #[tokio::test]
    async fn no_shared_category_means_no_suggestion() {
        let store = MemoryEventStore {
            events: vec![
                target(&[1], &[1], &[Emotion::Joy]),
                solved(1, &[2], &[1], &[Emotion::Joy], "wrong category"),
            ],
            ..Default::default()
        };

        assert_eq!(Recommender::new(store).suggest(USER, 100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn target_without_categories_gets_no_suggestion() {
        let store = MemoryEventStore {
            events: vec![target(&[], &[1], &[]), solved(1, &[1], &[1], &[], "walk")],
            ..Default::default()
        };

        assert_eq!(Recommender::new(store).suggest(USER, 100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn target_is_never_its_own_suggestion() {
        let store = MemoryEventStore {
            events: vec![Event {
                solution: Some("already solved".to_string()),
                ..target(&[1], &[], &[])
            }],
            ..Default::default()
        };

        assert_eq!(Recommender::new(store).suggest(USER, 100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn other_users_events_are_invisible() {
        let store = MemoryEventStore {
            events: vec![
                target(&[1], &[], &[]),
                Event { user_id: 2, ..solved(1, &[1], &[], &[], "not yours") },
            ],
            ..Default::default()
        };

        let recommender = Recommender::new(store);
        assert_eq!(recommender.suggest(USER, 100).await.unwrap(), None);
        assert!(matches!(recommender.suggest(2, 100).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let recommender = Recommender::new(MemoryEventStore::default());
        assert!(matches!(recommender.suggest(USER, 42).await, Err(AppError::NotFound)));
    }
}
