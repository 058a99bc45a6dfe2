use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::session::QuizSessionConfig;

pub const ALL_PROBLEMS_NAME: &str = "All Problems";
pub const FAVORITES_NAME: &str = "Favorites";

/// Where the question pool of a session comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionSource {
    All,
    Favorites,
    QuizSet { id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: SessionSource,
    pub name: String,
    pub size: usize,
}

/// Never exceeds what the pool holds; an absent request takes the whole pool.
pub fn clamp_question_count(requested: Option<usize>, available: usize) -> usize {
    if available == 0 {
        return 0;
    }
    requested.unwrap_or(available).clamp(1, available)
}

/// Shuffles the pool and keeps the first `requested` ids.
pub fn build_session_config<R: Rng + ?Sized>(
    pool: Vec<String>,
    requested: Option<usize>,
    timer_seconds: Option<u32>,
    source_name: String,
    rng: &mut R,
) -> Result<QuizSessionConfig> {
    let mut seen = HashSet::new();
    let mut ids: Vec<String> = pool.into_iter().filter(|id| seen.insert(id.clone())).collect();
    if ids.is_empty() {
        return Err(Error::BadRequest(format!(
            "No problems available in {}",
            source_name
        )));
    }

    let count = clamp_question_count(requested, ids.len());
    ids.shuffle(rng);
    ids.truncate(count);

    Ok(QuizSessionConfig {
        problem_ids: ids,
        timer_seconds,
        source_name,
        show_hints: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn pool(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p{}", i)).collect()
    }

    #[test]
    fn count_is_clamped_to_pool() {
        assert_eq!(clamp_question_count(Some(50), 7), 7);
        assert_eq!(clamp_question_count(Some(0), 7), 1);
        assert_eq!(clamp_question_count(Some(3), 7), 3);
        assert_eq!(clamp_question_count(None, 7), 7);
        assert_eq!(clamp_question_count(Some(5), 0), 0);
    }

    #[test]
    fn config_is_shuffled_subset() {
        let mut rng = StdRng::seed_from_u64(7);
        let config =
            build_session_config(pool(20), Some(5), Some(30), "Arrays".to_string(), &mut rng).unwrap();

        assert_eq!(config.problem_ids.len(), 5);
        assert_eq!(config.timer_seconds, Some(30));
        assert_eq!(config.source_name, "Arrays");
        let unique: HashSet<&String> = config.problem_ids.iter().collect();
        assert_eq!(unique.len(), 5);
        assert!(config.problem_ids.iter().all(|id| pool(20).contains(id)));
    }

    #[test]
    fn whole_pool_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = build_session_config(pool(10), None, None, "All".to_string(), &mut rng).unwrap();
        let mut sorted = config.problem_ids.clone();
        sorted.sort();
        let mut expected = pool(10);
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn duplicate_ids_are_collapsed() {
        let mut rng = StdRng::seed_from_u64(1);
        let ids = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let config = build_session_config(ids, Some(10), None, "Set".to_string(), &mut rng).unwrap();
        assert_eq!(config.problem_ids.len(), 2);
    }

    #[test]
    fn empty_pool_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = build_session_config(Vec::new(), Some(3), None, FAVORITES_NAME.to_string(), &mut rng);
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn source_wire_format() {
        let id = Uuid::new_v4();
        let parsed: SessionSource = serde_json::from_value(json!({ "type": "quiz_set", "id": id })).unwrap();
        assert_eq!(parsed, SessionSource::QuizSet { id });
        let parsed: SessionSource = serde_json::from_value(json!({ "type": "favorites" })).unwrap();
        assert_eq!(parsed, SessionSource::Favorites);
    }
}
