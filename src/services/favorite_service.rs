use sqlx::PgPool;

use crate::error::Result;
use crate::models::favorite::Favorite;

#[derive(Clone)]
pub struct FavoriteService {
    pool: PgPool,
}

impl FavoriteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT id, user_id, problem_id, created_at
            FROM favorites
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(favorites)
    }

    pub async fn list_ids(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .list(user_id)
            .await?
            .into_iter()
            .map(|f| f.problem_id)
            .collect())
    }

    pub async fn count(&self, user_id: &str) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM favorites WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Returns `true` when a new row was written.
    pub async fn add(&self, user_id: &str, problem_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, problem_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, problem_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(problem_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove(&self, user_id: &str, problem_id: &str) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM favorites WHERE user_id = $1 AND problem_id = $2"#)
            .bind(user_id)
            .bind(problem_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flips the favorite flag inside one transaction and returns the state
    /// the database ended up in.
    pub async fn toggle(&self, user_id: &str, problem_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query(r#"DELETE FROM favorites WHERE user_id = $1 AND problem_id = $2"#)
            .bind(user_id)
            .bind(problem_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                r#"
                INSERT INTO favorites (user_id, problem_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, problem_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(problem_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let is_favorite = removed == 0;
        tracing::debug!(user_id, problem_id, is_favorite, "Favorite toggled");
        Ok(is_favorite)
    }

    /// Idempotent bulk add. Returns how many favorites are new.
    pub async fn mark_many(&self, user_id: &str, problem_ids: &[String]) -> Result<u64> {
        if problem_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, problem_id)
            SELECT $1, UNNEST($2::text[])
            ON CONFLICT (user_id, problem_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(problem_ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn clear(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM favorites WHERE user_id = $1"#)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
