use serde::Serialize;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::models::problem::{Difficulty, Problem};
use crate::models::progress::{ProgressRecord, ProgressRow, ProgressStatus};
use crate::services::grading_service::GradingService;

const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Sink for the status change caused by grading one question. Implementations
/// must not block the caller.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressRecorder: Send + Sync {
    fn record(&self, user_id: String, problem_id: String, status: ProgressStatus);
}

#[derive(Clone)]
pub struct ProgressService {
    pool: PgPool,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lazily creates the record. `NotAttempted` is stored as the absence of
    /// a row.
    pub async fn upsert(
        &self,
        user_id: &str,
        problem_id: &str,
        status: ProgressStatus,
    ) -> Result<Option<ProgressRecord>> {
        if status == ProgressStatus::NotAttempted {
            sqlx::query(r#"DELETE FROM progress WHERE user_id = $1 AND problem_id = $2"#)
                .bind(user_id)
                .bind(problem_id)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            INSERT INTO progress (user_id, problem_id, status, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, problem_id)
            DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()
            RETURNING user_id, problem_id, status, updated_at
            "#,
        )
        .bind(user_id)
        .bind(problem_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(row.try_into()?))
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<ProgressRecord>> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT user_id, problem_id, status, updated_at
            FROM progress
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProgressRecord::try_from).collect()
    }

    pub async fn status_map(&self, user_id: &str) -> Result<HashMap<String, ProgressStatus>> {
        Ok(self
            .list(user_id)
            .await?
            .into_iter()
            .map(|r| (r.problem_id, r.status))
            .collect())
    }

    pub async fn clear(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM progress WHERE user_id = $1"#)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl ProgressRecorder for ProgressService {
    fn record(&self, user_id: String, problem_id: String, status: ProgressStatus) {
        let svc = self.clone();
        tokio::spawn(async move {
            if let Err(e) = svc.upsert(&user_id, &problem_id, status).await {
                tracing::warn!(
                    error = ?e,
                    user_id = %user_id,
                    problem_id = %problem_id,
                    status = %status,
                    "Failed to record progress"
                );
            }
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicProgress {
    pub total: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_attempted: usize,
    pub completion_percentage: f64,
    pub by_difficulty: BTreeMap<Difficulty, usize>,
    pub completed_by_difficulty: BTreeMap<Difficulty, usize>,
    pub by_topic: BTreeMap<String, TopicProgress>,
    pub recent: Vec<ProgressRecord>,
}

/// Aggregates records against the catalog. Records for problems that are no
/// longer in the catalog are ignored.
pub fn compute_stats(problems: &[Problem], records: &[ProgressRecord]) -> ProgressStats {
    let status: HashMap<&str, ProgressStatus> = records
        .iter()
        .map(|r| (r.problem_id.as_str(), r.status))
        .collect();

    let mut by_difficulty: BTreeMap<Difficulty, usize> =
        Difficulty::ALL.iter().map(|d| (*d, 0)).collect();
    let mut completed_by_difficulty = by_difficulty.clone();
    let mut by_topic: BTreeMap<String, TopicProgress> = BTreeMap::new();
    let mut completed = 0;
    let mut in_progress = 0;

    for problem in problems {
        let state = status
            .get(problem.id.as_str())
            .copied()
            .unwrap_or(ProgressStatus::NotAttempted);
        let is_completed = state == ProgressStatus::Completed;

        *by_difficulty.entry(problem.difficulty).or_default() += 1;
        match state {
            ProgressStatus::Completed => {
                completed += 1;
                *completed_by_difficulty.entry(problem.difficulty).or_default() += 1;
            }
            ProgressStatus::InProgress => in_progress += 1,
            ProgressStatus::NotAttempted => {}
        }

        for topic in &problem.topics {
            let entry = by_topic.entry(topic.clone()).or_default();
            entry.total += 1;
            if is_completed {
                entry.completed += 1;
            }
        }
    }

    let mut recent: Vec<ProgressRecord> = records
        .iter()
        .filter(|r| problems.iter().any(|p| p.id == r.problem_id))
        .cloned()
        .collect();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    recent.truncate(RECENT_ACTIVITY_LIMIT);

    ProgressStats {
        total: problems.len(),
        completed,
        in_progress,
        not_attempted: problems.len() - completed - in_progress,
        completion_percentage: GradingService::accuracy(completed, problems.len()),
        by_difficulty,
        completed_by_difficulty,
        by_topic,
        recent,
    }
}
