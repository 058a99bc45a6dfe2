use serde::{Deserialize, Serialize};

/// One graded (non-skipped) question of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub problem_id: String,
    pub problem_title: String,
    pub selected_option_id: Option<String>,
    pub is_correct: bool,
    pub timed_out: bool,
    pub time_spent_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub source_name: String,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub time_spent_seconds: u64,
    pub skipped: usize,
    pub results: Vec<SessionResult>,
}

/// Everything a session needs to start, handed over explicitly when the
/// session is created. `timer_seconds` is `None` when the timer is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSessionConfig {
    pub problem_ids: Vec<String>,
    pub timer_seconds: Option<u32>,
    pub source_name: String,
    /// Show each question's key insight without being asked.
    #[serde(default)]
    pub show_hints: bool,
}
