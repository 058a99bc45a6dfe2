use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::problem::{parse_problem, Problem, ProblemRow};

const PROBLEM_COLUMNS: &str = r#"
    id, position, title, difficulty, topics, problem_summary, key_insight,
    canonical_one_liner, pseudocode, common_traps, quiz, created_at, updated_at
"#;

#[derive(Clone)]
pub struct ProblemService {
    pool: PgPool,
}

impl ProblemService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the whole catalog in catalog order. A single invalid row fails
    /// the whole load.
    pub async fn list_all(&self) -> Result<Vec<Problem>> {
        let rows = sqlx::query_as::<_, ProblemRow>(&format!(
            "SELECT {} FROM problems ORDER BY position ASC, id ASC",
            PROBLEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Problem::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Problem> {
        let row = sqlx::query_as::<_, ProblemRow>(&format!(
            "SELECT {} FROM problems WHERE id = $1",
            PROBLEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Problem {} not found", id)))?;

        Problem::try_from(row)
    }

    /// Returns the problems in the order of `ids`. Ids that no longer exist
    /// are dropped.
    pub async fn get_many_ordered(&self, ids: &[String]) -> Result<Vec<Problem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ProblemRow>(&format!(
            "SELECT {} FROM problems WHERE id = ANY($1)",
            PROBLEM_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_id: HashMap<String, Problem> = HashMap::with_capacity(rows.len());
        for row in rows {
            let problem = Problem::try_from(row)?;
            by_id.insert(problem.id.clone(), problem);
        }
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    pub async fn list_ids(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"SELECT id FROM problems ORDER BY position ASC, id ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM problems"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Writes validated problems; their slice order becomes catalog order.
    pub async fn upsert_many(&self, problems: &[Problem]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for (position, problem) in problems.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO problems (
                    id, position, title, difficulty, topics, problem_summary, key_insight,
                    canonical_one_liner, pseudocode, common_traps, quiz
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (id) DO UPDATE SET
                    position = EXCLUDED.position,
                    title = EXCLUDED.title,
                    difficulty = EXCLUDED.difficulty,
                    topics = EXCLUDED.topics,
                    problem_summary = EXCLUDED.problem_summary,
                    key_insight = EXCLUDED.key_insight,
                    canonical_one_liner = EXCLUDED.canonical_one_liner,
                    pseudocode = EXCLUDED.pseudocode,
                    common_traps = EXCLUDED.common_traps,
                    quiz = EXCLUDED.quiz,
                    updated_at = NOW()
                "#,
            )
            .bind(&problem.id)
            .bind(position as i32)
            .bind(&problem.title)
            .bind(problem.difficulty.as_str())
            .bind(&problem.topics)
            .bind(&problem.problem_summary)
            .bind(&problem.key_insight)
            .bind(&problem.canonical_idea.one_liner)
            .bind(&problem.pseudocode)
            .bind(&problem.common_traps)
            .bind(Json(&problem.quiz))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(problems.len())
    }

    pub async fn import_seed_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let problems = parse_seed(&raw)?;
        let imported = self.upsert_many(&problems).await?;
        tracing::info!(path = %path.display(), imported, "Seeded problem catalog");
        Ok(imported)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedFile {
    Wrapped { problems: Vec<JsonValue> },
    Bare(Vec<JsonValue>),
}

/// Parses a seed document (`{"problems": [...]}` or a bare array) and
/// validates every record. Duplicate ids are rejected.
pub fn parse_seed(raw: &str) -> Result<Vec<Problem>> {
    let records = match serde_json::from_str::<SeedFile>(raw)
        .map_err(|e| Error::DataIntegrity(format!("unreadable seed file: {}", e)))?
    {
        SeedFile::Wrapped { problems } => problems,
        SeedFile::Bare(problems) => problems,
    };

    let mut seen = HashSet::new();
    let mut problems = Vec::with_capacity(records.len());
    for record in records {
        let problem = parse_problem(record)?;
        if !seen.insert(problem.id.clone()) {
            return Err(Error::DataIntegrity(format!(
                "problem {} appears more than once",
                problem.id
            )));
        }
        problems.push(problem);
    }
    Ok(problems)
}
