use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

pub const DEFAULT_QUESTIONS_PER_QUIZ: u32 = 5;
pub const DEFAULT_TIMER_SECONDS: u32 = 30;

#[derive(Debug, Clone, FromRow)]
pub struct SettingsRow {
    pub user_id: String,
    pub questions_per_quiz: i32,
    pub timer_enabled: bool,
    pub timer_seconds: i32,
    pub show_hints: bool,
    pub updated_at: DateTime<Utc>,
}

/// Per-user quiz defaults. A user without a stored row gets `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizSettings {
    pub questions_per_quiz: u32,
    pub timer_enabled: bool,
    pub timer_seconds: u32,
    pub show_hints: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            questions_per_quiz: DEFAULT_QUESTIONS_PER_QUIZ,
            timer_enabled: false,
            timer_seconds: DEFAULT_TIMER_SECONDS,
            show_hints: false,
        }
    }
}

impl QuizSettings {
    /// Per-question duration, `None` when the timer is off.
    pub fn timer(&self) -> Option<u32> {
        self.timer_enabled.then_some(self.timer_seconds)
    }
}

impl From<SettingsRow> for QuizSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            questions_per_quiz: row.questions_per_quiz.max(1) as u32,
            timer_enabled: row.timer_enabled,
            timer_seconds: row.timer_seconds.max(1) as u32,
            show_hints: row.show_hints,
        }
    }
}
