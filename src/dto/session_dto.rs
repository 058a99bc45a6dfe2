use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::problem::{Difficulty, Problem};
use crate::models::settings::QuizSettings;
use crate::services::session_config::{SessionSource, SourceSummary};
use crate::services::session_service::{CheckOutcome, QuestionState, QuizSession};

/// Omitted fields fall back to the caller's saved quiz settings.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartSessionRequest {
    pub source: SessionSource,
    #[validate(range(min = 1))]
    pub question_count: Option<usize>,
    pub timer_enabled: Option<bool>,
    #[validate(range(min = 5, max = 3600))]
    pub timer_seconds: Option<u32>,
    pub show_hints: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOptions {
    pub question_count: usize,
    pub timer_seconds: Option<u32>,
    pub show_hints: bool,
}

impl StartSessionRequest {
    pub fn options(&self, settings: &QuizSettings) -> StartOptions {
        let timer_enabled = self.timer_enabled.unwrap_or(settings.timer_enabled);
        StartOptions {
            question_count: self
                .question_count
                .unwrap_or(settings.questions_per_quiz as usize),
            timer_seconds: timer_enabled
                .then(|| self.timer_seconds.unwrap_or(settings.timer_seconds)),
            show_hints: self.show_hints.unwrap_or(settings.show_hints),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SelectOptionRequest {
    #[validate(length(min = 1, max = 64))]
    pub option_id: String,
}

/// An answer choice without its correctness flag.
#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: String,
    pub text: String,
}

/// Learning content shown once the question has been checked.
#[derive(Debug, Clone, Serialize)]
pub struct Reveal {
    pub key_insight: Option<String>,
    pub one_liner: String,
    pub pseudocode: Vec<String>,
    pub common_traps: Vec<String>,
}

impl From<&Problem> for Reveal {
    fn from(problem: &Problem) -> Self {
        Self {
            key_insight: problem.key_insight.clone(),
            one_liner: problem.canonical_idea.one_liner.clone(),
            pseudocode: problem.pseudocode.clone(),
            common_traps: problem.common_traps.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub problem_id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub topics: Vec<String>,
    pub question: String,
    pub options: Vec<OptionView>,
    pub has_hint: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reveal: Option<Reveal>,
}

impl From<&Problem> for QuestionView {
    fn from(problem: &Problem) -> Self {
        Self {
            problem_id: problem.id.clone(),
            title: problem.title.clone(),
            difficulty: problem.difficulty,
            topics: problem.topics.clone(),
            question: problem.quiz.question.clone(),
            options: problem
                .quiz
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id.clone(),
                    text: o.text.clone(),
                })
                .collect(),
            has_hint: problem.key_insight.is_some(),
            hint: None,
            reveal: None,
        }
    }
}

impl QuestionView {
    pub fn for_session(session: &QuizSession) -> Self {
        let problem = session.current_problem();
        let mut view = Self::from(problem);
        view.hint = session.visible_hint().map(str::to_string);
        if session.is_checked() {
            view.reveal = Some(Reveal::from(problem));
        }
        view
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub source_name: String,
    pub position: usize,
    pub total_questions: usize,
    pub complete: bool,
    pub timer_seconds: Option<u32>,
    pub remaining_seconds: Option<u32>,
    pub deadline: Option<DateTime<Utc>>,
    pub question: QuestionView,
    pub state: QuestionState,
    pub answered: usize,
    pub correct: usize,
    pub skipped: usize,
}

impl SessionView {
    pub fn render(session: &QuizSession, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id(),
            source_name: session.source_name().to_string(),
            position: session.index() + 1,
            total_questions: session.len(),
            complete: session.is_complete(),
            timer_seconds: session.timer_seconds(),
            remaining_seconds: session.remaining_seconds(now),
            deadline: session.deadline(),
            question: QuestionView::for_session(session),
            state: session.state().clone(),
            answered: session.results().len(),
            correct: session.results().iter().filter(|r| r.is_correct).count(),
            skipped: session.skipped(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    #[serde(flatten)]
    pub outcome: CheckOutcome,
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceListResponse {
    pub sources: Vec<SourceSummary>,
    pub settings: QuizSettings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::problem::fixture;
    use crate::models::session::QuizSessionConfig;
    use serde_json::json;

    #[test]
    fn question_view_hides_correctness() {
        let problem = fixture("p1", "Two Sum", Difficulty::Easy, &[]);
        let value = serde_json::to_value(QuestionView::from(&problem)).unwrap();
        let options = value["options"].as_array().unwrap();
        assert_eq!(options.len(), 3);
        assert!(options.iter().all(|o| o.get("is_correct").is_none()));
        assert!(options.iter().all(|o| o.get("why_wrong").is_none()));
    }

    #[test]
    fn unchecked_state_reveals_nothing() {
        let problem = fixture("p1", "Two Sum", Difficulty::Easy, &[]);
        let config = QuizSessionConfig {
            problem_ids: vec!["p1".to_string()],
            timer_seconds: None,
            source_name: "All Problems".to_string(),
            show_hints: false,
        };
        let now = Utc::now();
        let mut session = QuizSession::start("u1", config, vec![problem], now).unwrap();
        session.select_option("A", now).unwrap();

        let value = serde_json::to_value(SessionView::render(&session, now)).unwrap();
        assert_eq!(value["state"], json!({ "state": "option_selected", "option_id": "A" }));
        assert_eq!(value["position"], 1);
        assert!(!value.to_string().contains("correct_option_id"));
    }

    #[test]
    fn omitted_fields_use_saved_settings() {
        let request: StartSessionRequest = serde_json::from_value(json!({
            "source": { "type": "all" }
        }))
        .unwrap();
        let options = request.options(&QuizSettings::default());
        assert_eq!(
            options,
            StartOptions {
                question_count: 5,
                timer_seconds: None,
                show_hints: false,
            }
        );

        let saved = QuizSettings {
            questions_per_quiz: 12,
            timer_enabled: true,
            timer_seconds: 45,
            show_hints: true,
        };
        let options = request.options(&saved);
        assert_eq!(options.question_count, 12);
        assert_eq!(options.timer_seconds, Some(45));
        assert!(options.show_hints);
    }

    #[test]
    fn explicit_fields_override_settings() {
        let request: StartSessionRequest = serde_json::from_value(json!({
            "source": { "type": "favorites" },
            "question_count": 3,
            "timer_enabled": true,
            "show_hints": false
        }))
        .unwrap();
        let saved = QuizSettings {
            show_hints: true,
            ..QuizSettings::default()
        };
        let options = request.options(&saved);
        assert_eq!(options.question_count, 3);
        assert_eq!(options.timer_seconds, Some(30));
        assert!(!options.show_hints);

        let request: StartSessionRequest = serde_json::from_value(json!({
            "source": { "type": "all" },
            "timer_enabled": false,
            "timer_seconds": 90
        }))
        .unwrap();
        let saved = QuizSettings {
            timer_enabled: true,
            ..QuizSettings::default()
        };
        assert_eq!(request.options(&saved).timer_seconds, None);
    }

    fn insightful() -> Problem {
        let mut problem = fixture("p1", "Two Sum", Difficulty::Easy, &[]);
        problem.key_insight = Some("Store complements as you go".to_string());
        problem
    }

    fn single(problem: Problem, show_hints: bool, now: DateTime<Utc>) -> QuizSession {
        let config = QuizSessionConfig {
            problem_ids: vec![problem.id.clone()],
            timer_seconds: None,
            source_name: "All Problems".to_string(),
            show_hints,
        };
        QuizSession::start("u1", config, vec![problem], now).unwrap()
    }

    #[test]
    fn reveal_appears_only_after_check() {
        let now = Utc::now();
        let mut session = single(insightful(), false, now);

        let value = serde_json::to_value(SessionView::render(&session, now)).unwrap();
        assert_eq!(value["question"]["has_hint"], true);
        assert!(value["question"].get("hint").is_none());
        assert!(value["question"].get("reveal").is_none());

        session.select_option("B", now).unwrap();
        session.check(now).unwrap();
        let value = serde_json::to_value(SessionView::render(&session, now)).unwrap();
        let reveal = &value["question"]["reveal"];
        assert_eq!(reveal["one_liner"], "use a hash map");
        assert_eq!(reveal["pseudocode"], json!(["for each x", "  check complement"]));
        assert_eq!(reveal["common_traps"], json!(["off by one"]));
        assert_eq!(reveal["key_insight"], "Store complements as you go");
    }

    #[test]
    fn requested_hint_shows_before_check() {
        let now = Utc::now();
        let mut session = single(insightful(), false, now);
        session.request_hint(now).unwrap();

        let value = serde_json::to_value(SessionView::render(&session, now)).unwrap();
        assert_eq!(value["question"]["hint"], "Store complements as you go");
        assert!(value["question"].get("reveal").is_none());
        assert_eq!(value["state"]["state"], "unanswered");

        let auto = single(insightful(), true, now);
        let value = serde_json::to_value(SessionView::render(&auto, now)).unwrap();
        assert_eq!(value["question"]["hint"], "Store complements as you go");
    }

    #[test]
    fn zero_question_count_fails_validation() {
        let request: StartSessionRequest = serde_json::from_value(json!({
            "source": { "type": "all" },
            "question_count": 0
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
