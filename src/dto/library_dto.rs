use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::problem::{Difficulty, Problem};
use crate::models::quiz_set::QuizSet;

#[derive(Debug, Clone, Serialize)]
pub struct FavoritesResponse {
    pub total: usize,
    pub by_difficulty: BTreeMap<Difficulty, usize>,
    pub problems: Vec<Problem>,
}

impl FavoritesResponse {
    pub fn new(problems: Vec<Problem>) -> Self {
        let mut by_difficulty: BTreeMap<Difficulty, usize> =
            Difficulty::ALL.iter().map(|d| (*d, 0)).collect();
        for problem in &problems {
            *by_difficulty.entry(problem.difficulty).or_default() += 1;
        }
        Self {
            total: problems.len(),
            by_difficulty,
            problems,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteToggleResponse {
    pub problem_id: String,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizSetResponse {
    pub id: Uuid,
    pub name: String,
    pub size: usize,
    pub problem_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<QuizSet> for QuizSetResponse {
    fn from(set: QuizSet) -> Self {
        Self {
            id: set.id,
            name: set.name,
            size: set.problem_ids.len(),
            problem_ids: set.problem_ids,
            created_at: set.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizSetDetailResponse {
    #[serde(flatten)]
    pub set: QuizSetResponse,
    pub problems: Vec<Problem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub total_problems: i64,
    pub favorites: i64,
    pub quiz_sets: i64,
    pub completed: usize,
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearScope {
    Progress,
    Favorites,
    QuizSets,
    Settings,
    All,
}

impl ClearScope {
    pub fn includes(self, other: ClearScope) -> bool {
        self == ClearScope::All || self == other
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClearDataQuery {
    pub scope: ClearScope,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClearDataResponse {
    pub progress: u64,
    pub favorites: u64,
    pub quiz_sets: u64,
    pub settings: u64,
}
