use serde::Deserialize;
use validator::Validate;

use crate::models::settings::QuizSettings;

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(range(min = 1, max = 100))]
    pub questions_per_quiz: Option<u32>,
    pub timer_enabled: Option<bool>,
    #[validate(range(min = 5, max = 3600))]
    pub timer_seconds: Option<u32>,
    pub show_hints: Option<bool>,
}

impl UpdateSettingsRequest {
    pub fn apply(&self, current: QuizSettings) -> QuizSettings {
        QuizSettings {
            questions_per_quiz: self.questions_per_quiz.unwrap_or(current.questions_per_quiz),
            timer_enabled: self.timer_enabled.unwrap_or(current.timer_enabled),
            timer_seconds: self.timer_seconds.unwrap_or(current.timer_seconds),
            show_hints: self.show_hints.unwrap_or(current.show_hints),
        }
    }
}
