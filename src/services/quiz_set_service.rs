use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::quiz_set::QuizSet;

pub const MISSING_NAME_PROMPT: &str = "Please enter a name for the quiz set";
pub const EMPTY_SELECTION_PROMPT: &str = "Please select at least one problem";

/// Trims the name and dedupes ids (first occurrence wins). Rejects blank
/// names and empty id lists.
pub fn prepare_quiz_set(name: &str, problem_ids: &[String]) -> Result<(String, Vec<String>)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::BadRequest(MISSING_NAME_PROMPT.to_string()));
    }
    let mut seen = HashSet::new();
    let ids: Vec<String> = problem_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();
    if ids.is_empty() {
        return Err(Error::BadRequest(EMPTY_SELECTION_PROMPT.to_string()));
    }
    Ok((name.to_string(), ids))
}

#[derive(Clone)]
pub struct QuizSetService {
    pool: PgPool,
}

impl QuizSetService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: &str, name: &str, problem_ids: &[String]) -> Result<QuizSet> {
        let (name, ids) = prepare_quiz_set(name, problem_ids)?;
        let set = sqlx::query_as::<_, QuizSet>(
            r#"
            INSERT INTO quiz_sets (user_id, name, problem_ids)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, problem_ids, created_at
            "#,
        )
        .bind(user_id)
        .bind(&name)
        .bind(&ids)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(quiz_set_id = %set.id, user_id, size = ids.len(), "Quiz set created");
        Ok(set)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<QuizSet>> {
        let sets = sqlx::query_as::<_, QuizSet>(
            r#"
            SELECT id, user_id, name, problem_ids, created_at
            FROM quiz_sets
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sets)
    }

    pub async fn get(&self, user_id: &str, id: Uuid) -> Result<QuizSet> {
        sqlx::query_as::<_, QuizSet>(
            r#"
            SELECT id, user_id, name, problem_ids, created_at
            FROM quiz_sets
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Quiz set not found".to_string()))
    }

    pub async fn count(&self, user_id: &str) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM quiz_sets WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn delete(&self, user_id: &str, id: Uuid) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM quiz_sets WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Quiz set not found".to_string()));
        }
        Ok(())
    }

    pub async fn clear(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM quiz_sets WHERE user_id = $1"#)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = prepare_quiz_set("   ", &ids(&["p1"])).unwrap_err();
        assert!(matches!(err, Error::BadRequest(msg) if msg == MISSING_NAME_PROMPT));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let err = prepare_quiz_set("Arrays", &[]).unwrap_err();
        assert!(matches!(err, Error::BadRequest(msg) if msg == EMPTY_SELECTION_PROMPT));
    }

    #[test]
    fn name_is_trimmed_and_ids_deduped() {
        let (name, list) = prepare_quiz_set("  Graphs ", &ids(&["b", "a", "b"])).unwrap();
        assert_eq!(name, "Graphs");
        assert_eq!(list, ids(&["b", "a"]));
    }
}
