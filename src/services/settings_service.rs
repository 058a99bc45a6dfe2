use sqlx::PgPool;

use crate::error::Result;
use crate::models::settings::{QuizSettings, SettingsRow};

#[derive(Clone)]
pub struct SettingsService {
    pool: PgPool,
}

impl SettingsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: &str) -> Result<QuizSettings> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT user_id, questions_per_quiz, timer_enabled, timer_seconds, show_hints, updated_at
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(QuizSettings::from).unwrap_or_default())
    }

    pub async fn save(&self, user_id: &str, settings: &QuizSettings) -> Result<QuizSettings> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            INSERT INTO user_settings (user_id, questions_per_quiz, timer_enabled, timer_seconds, show_hints)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET questions_per_quiz = EXCLUDED.questions_per_quiz,
                timer_enabled = EXCLUDED.timer_enabled,
                timer_seconds = EXCLUDED.timer_seconds,
                show_hints = EXCLUDED.show_hints,
                updated_at = NOW()
            RETURNING user_id, questions_per_quiz, timer_enabled, timer_seconds, show_hints, updated_at
            "#,
        )
        .bind(user_id)
        .bind(settings.questions_per_quiz as i32)
        .bind(settings.timer_enabled)
        .bind(settings.timer_seconds as i32)
        .bind(settings.show_hints)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id, "Quiz settings saved");
        Ok(QuizSettings::from(row))
    }

    /// Drops the stored row so the defaults apply again.
    pub async fn reset(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM user_settings WHERE user_id = $1"#)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
