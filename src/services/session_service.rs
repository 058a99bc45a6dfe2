use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::problem::Problem;
use crate::models::progress::ProgressStatus;
use crate::models::session::{QuizSessionConfig, ResultSummary, SessionResult};
use crate::services::grading_service::{Grade, GradingService};
use crate::services::progress_service::ProgressRecorder;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("A quiz session needs at least one problem")]
    Empty,
    #[error("Please select an option before checking")]
    NothingSelected,
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("This question has already been checked")]
    AlreadyChecked,
    #[error("Check the current answer before moving on")]
    NotChecked,
    #[error("The quiz session is already complete")]
    Complete,
    #[error("The quiz session is still in progress")]
    InProgress,
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Empty | SessionError::NothingSelected | SessionError::UnknownOption(_) => {
                Error::BadRequest(err.to_string())
            }
            _ => Error::Conflict(err.to_string()),
        }
    }
}

/// Per-question state. `Checked` is final for the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuestionState {
    Unanswered,
    OptionSelected {
        option_id: String,
    },
    Checked {
        selected_option_id: Option<String>,
        grade: Grade,
        timed_out: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub problem_id: String,
    pub grade: Grade,
    pub timed_out: bool,
    pub session_complete: bool,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    user_id: String,
    source_name: String,
    problems: Vec<Problem>,
    timer_seconds: Option<u32>,
    show_hints: bool,
    index: usize,
    state: QuestionState,
    hint_requested: bool,
    question_started_at: DateTime<Utc>,
    results: Vec<SessionResult>,
    skipped: usize,
    complete: bool,
    last_activity: DateTime<Utc>,
}

impl QuizSession {
    /// `problems` must already be in session order.
    pub fn start(
        user_id: &str,
        config: QuizSessionConfig,
        problems: Vec<Problem>,
        now: DateTime<Utc>,
    ) -> std::result::Result<Self, SessionError> {
        if problems.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            source_name: config.source_name,
            problems,
            timer_seconds: config.timer_seconds.filter(|s| *s > 0),
            show_hints: config.show_hints,
            index: 0,
            state: QuestionState::Unanswered,
            hint_requested: false,
            question_started_at: now,
            results: Vec::new(),
            skipped: 0,
            complete: false,
            last_activity: now,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn problem_ids(&self) -> Vec<String> {
        self.problems.iter().map(|p| p.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn state(&self) -> &QuestionState {
        &self.state
    }

    pub fn results(&self) -> &[SessionResult] {
        &self.results
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn timer_seconds(&self) -> Option<u32> {
        self.timer_seconds
    }

    pub fn current_problem(&self) -> &Problem {
        &self.problems[self.index]
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn is_checked(&self) -> bool {
        matches!(self.state, QuestionState::Checked { .. })
    }

    /// The key insight of the current question, once asked for, when the
    /// session shows hints automatically, or after the check.
    pub fn visible_hint(&self) -> Option<&str> {
        if self.show_hints || self.hint_requested || self.is_checked() {
            self.current_problem().key_insight.as_deref()
        } else {
            None
        }
    }

    /// Opens the hint for the current question. Allowed before or after the
    /// check; the answer state is left alone.
    pub fn request_hint(&mut self, now: DateTime<Utc>) -> std::result::Result<Option<&str>, SessionError> {
        if self.complete {
            return Err(SessionError::Complete);
        }
        self.hint_requested = true;
        self.last_activity = now;
        Ok(self.current_problem().key_insight.as_deref())
    }

    /// The countdown only runs while the current question is open.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        if self.complete || self.is_checked() {
            return None;
        }
        self.timer_seconds
            .map(|secs| self.question_started_at + Duration::seconds(secs as i64))
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Option<u32> {
        self.deadline()
            .map(|deadline| (deadline - now).num_seconds().max(0) as u32)
    }

    fn elapsed_seconds(&self, now: DateTime<Utc>) -> u32 {
        match self.timer_seconds {
            Some(limit) => ((now - self.question_started_at).num_seconds().max(0) as u32).min(limit),
            None => 0,
        }
    }

    /// Forces the check once the deadline has passed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<CheckOutcome> {
        match self.deadline() {
            Some(deadline) if deadline <= now => {
                tracing::debug!(session_id = %self.id, index = self.index, "Question timer expired");
                Some(self.grade_current(now, true))
            }
            _ => None,
        }
    }

    pub fn select_option(&mut self, option_id: &str, now: DateTime<Utc>) -> std::result::Result<(), SessionError> {
        self.ensure_open()?;
        if self.current_problem().quiz.option(option_id).is_none() {
            return Err(SessionError::UnknownOption(option_id.to_string()));
        }
        self.state = QuestionState::OptionSelected {
            option_id: option_id.to_string(),
        };
        self.last_activity = now;
        Ok(())
    }

    pub fn check(&mut self, now: DateTime<Utc>) -> std::result::Result<CheckOutcome, SessionError> {
        self.ensure_open()?;
        if matches!(self.state, QuestionState::Unanswered) {
            return Err(SessionError::NothingSelected);
        }
        Ok(self.grade_current(now, false))
    }

    /// Moves on without grading; the question counts towards neither side of
    /// the score.
    pub fn skip(&mut self, now: DateTime<Utc>) -> std::result::Result<(), SessionError> {
        self.ensure_open()?;
        self.skipped += 1;
        self.advance(now);
        Ok(())
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> std::result::Result<(), SessionError> {
        if self.complete {
            return Err(SessionError::Complete);
        }
        if !matches!(self.state, QuestionState::Checked { .. }) {
            return Err(SessionError::NotChecked);
        }
        self.advance(now);
        Ok(())
    }

    pub fn summary(&self) -> std::result::Result<ResultSummary, SessionError> {
        if !self.complete {
            return Err(SessionError::InProgress);
        }
        Ok(GradingService::summarize(&self.source_name, &self.results, self.skipped))
    }

    /// Replays the same ordered problems from the first question with an
    /// empty result log.
    pub fn retry(&mut self, now: DateTime<Utc>) -> std::result::Result<(), SessionError> {
        if !self.complete {
            return Err(SessionError::InProgress);
        }
        self.index = 0;
        self.state = QuestionState::Unanswered;
        self.hint_requested = false;
        self.question_started_at = now;
        self.results.clear();
        self.skipped = 0;
        self.complete = false;
        self.last_activity = now;
        Ok(())
    }

    fn ensure_open(&self) -> std::result::Result<(), SessionError> {
        if self.complete {
            return Err(SessionError::Complete);
        }
        if matches!(self.state, QuestionState::Checked { .. }) {
            return Err(SessionError::AlreadyChecked);
        }
        Ok(())
    }

    fn grade_current(&mut self, now: DateTime<Utc>, timed_out: bool) -> CheckOutcome {
        let selected = match &self.state {
            QuestionState::OptionSelected { option_id } => Some(option_id.clone()),
            _ => None,
        };
        let time_spent_seconds = self.elapsed_seconds(now);
        let problem = &self.problems[self.index];
        let grade = GradingService::grade(&problem.quiz, selected.as_deref());
        let problem_id = problem.id.clone();

        self.results.push(SessionResult {
            problem_id: problem_id.clone(),
            problem_title: problem.title.clone(),
            selected_option_id: selected.clone(),
            is_correct: grade.is_correct,
            timed_out,
            time_spent_seconds,
        });
        self.state = QuestionState::Checked {
            selected_option_id: selected,
            grade: grade.clone(),
            timed_out,
        };
        if self.index + 1 >= self.problems.len() {
            self.finish();
        }
        self.last_activity = now;

        CheckOutcome {
            problem_id,
            grade,
            timed_out,
            session_complete: self.complete,
        }
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        if self.index + 1 >= self.problems.len() {
            self.finish();
        } else {
            self.index += 1;
            self.state = QuestionState::Unanswered;
            self.hint_requested = false;
            self.question_started_at = now;
        }
        self.last_activity = now;
    }

    fn finish(&mut self) {
        self.complete = true;
        let correct = self.results.iter().filter(|r| r.is_correct).count();
        tracing::info!(
            session_id = %self.id,
            graded = self.results.len(),
            correct,
            skipped = self.skipped,
            "Quiz session complete"
        );
    }
}

fn record_outcome(recorder: &dyn ProgressRecorder, user_id: &str, outcome: &CheckOutcome) {
    recorder.record(
        user_id.to_string(),
        outcome.problem_id.clone(),
        ProgressStatus::after_grading(outcome.grade.is_correct),
    );
}

/// Live sessions keyed by id. Every access applies pending timer expiry
/// before doing anything else.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, QuizSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, QuizSession>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, session: QuizSession) -> Uuid {
        let id = session.id();
        tracing::info!(
            session_id = %id,
            user_id = %session.user_id(),
            questions = session.len(),
            timer_seconds = ?session.timer_seconds(),
            "Quiz session started"
        );
        self.lock().insert(id, session);
        id
    }

    pub fn with_session<R>(
        &self,
        user_id: &str,
        session_id: Uuid,
        now: DateTime<Utc>,
        recorder: &dyn ProgressRecorder,
        f: impl FnOnce(&mut QuizSession) -> Result<R>,
    ) -> Result<R> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(&session_id)
            .filter(|s| s.user_id() == user_id)
            .ok_or_else(|| Error::NotFound("Quiz session not found".to_string()))?;

        if let Some(outcome) = session.tick(now) {
            record_outcome(recorder, user_id, &outcome);
        }
        f(session)
    }

    /// Grades the current question and writes the resulting progress status.
    pub fn check(
        &self,
        user_id: &str,
        session_id: Uuid,
        now: DateTime<Utc>,
        recorder: &dyn ProgressRecorder,
    ) -> Result<CheckOutcome> {
        let outcome = self.with_session(user_id, session_id, now, recorder, |s| Ok(s.check(now)?))?;
        record_outcome(recorder, user_id, &outcome);
        Ok(outcome)
    }

    /// Drops the session and its in-memory results.
    pub fn remove(&self, user_id: &str, session_id: Uuid) -> Result<()> {
        let mut sessions = self.lock();
        match sessions.get(&session_id) {
            Some(s) if s.user_id() == user_id => {
                sessions.remove(&session_id);
                Ok(())
            }
            _ => Err(Error::NotFound("Quiz session not found".to_string())),
        }
    }

    /// One timer pass over every live session. Returns how many questions
    /// were force-checked.
    pub fn tick_all(&self, now: DateTime<Utc>, recorder: &dyn ProgressRecorder) -> usize {
        let mut sessions = self.lock();
        let mut expired = 0;
        for session in sessions.values_mut() {
            if let Some(outcome) = session.tick(now) {
                record_outcome(recorder, session.user_id(), &outcome);
                expired += 1;
            }
        }
        expired
    }

    pub fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.last_activity() >= cutoff);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::problem::{fixture, Difficulty};
    use crate::services::progress_service::MockProgressRecorder;

    fn problems(n: usize) -> Vec<Problem> {
        (0..n)
            .map(|i| fixture(&format!("p{}", i), &format!("Problem {}", i), Difficulty::Easy, &[]))
            .collect()
    }

    fn config(problems: &[Problem], timer_seconds: Option<u32>) -> QuizSessionConfig {
        QuizSessionConfig {
            problem_ids: problems.iter().map(|p| p.id.clone()).collect(),
            timer_seconds,
            source_name: "All Problems".to_string(),
            show_hints: false,
        }
    }

    fn session(n: usize, timer_seconds: Option<u32>, now: DateTime<Utc>) -> QuizSession {
        let problems = problems(n);
        QuizSession::start("u1", config(&problems, timer_seconds), problems, now).unwrap()
    }

    #[test]
    fn empty_session_is_rejected() {
        let result = QuizSession::start("u1", config(&[], None), Vec::new(), Utc::now());
        assert_eq!(result.unwrap_err(), SessionError::Empty);
    }

    #[test]
    fn check_requires_selection() {
        let now = Utc::now();
        let mut s = session(2, None, now);
        assert_eq!(s.check(now).unwrap_err(), SessionError::NothingSelected);
        assert_eq!(s.state(), &QuestionState::Unanswered);
        assert!(s.results().is_empty());
    }

    #[test]
    fn correct_option_grades_true() {
        let now = Utc::now();
        let mut s = session(2, None, now);
        s.select_option("B", now).unwrap();
        let outcome = s.check(now).unwrap();
        assert!(outcome.grade.is_correct);
        assert!(!outcome.session_complete);
        assert_eq!(s.results().len(), 1);
        assert_eq!(s.results()[0].time_spent_seconds, 0);
    }

    #[test]
    fn wrong_option_surfaces_explanation() {
        let now = Utc::now();
        let mut s = session(1, None, now);
        s.select_option("A", now).unwrap();
        let outcome = s.check(now).unwrap();
        assert!(!outcome.grade.is_correct);
        assert_eq!(outcome.grade.explanation.as_deref(), Some("Too slow for large inputs"));
    }

    #[test]
    fn reselecting_after_check_is_rejected() {
        let now = Utc::now();
        let mut s = session(2, None, now);
        s.select_option("A", now).unwrap();
        s.check(now).unwrap();
        assert_eq!(s.select_option("B", now).unwrap_err(), SessionError::AlreadyChecked);
        assert_eq!(s.check(now).unwrap_err(), SessionError::AlreadyChecked);
        assert!(!s.results()[0].is_correct);
    }

    #[test]
    fn selection_can_change_before_check() {
        let now = Utc::now();
        let mut s = session(1, None, now);
        s.select_option("A", now).unwrap();
        s.select_option("B", now).unwrap();
        assert!(s.check(now).unwrap().grade.is_correct);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let now = Utc::now();
        let mut s = session(1, None, now);
        assert_eq!(
            s.select_option("Z", now).unwrap_err(),
            SessionError::UnknownOption("Z".to_string())
        );
    }

    #[test]
    fn next_requires_check() {
        let now = Utc::now();
        let mut s = session(2, None, now);
        assert_eq!(s.next(now).unwrap_err(), SessionError::NotChecked);
        s.select_option("B", now).unwrap();
        s.check(now).unwrap();
        s.next(now).unwrap();
        assert_eq!(s.index(), 1);
        assert_eq!(s.state(), &QuestionState::Unanswered);
    }

    #[test]
    fn skip_does_not_log_result() {
        let now = Utc::now();
        let mut s = session(3, None, now);
        s.skip(now).unwrap();
        assert_eq!(s.index(), 1);
        assert!(s.results().is_empty());
        assert_eq!(s.skipped(), 1);
    }

    #[test]
    fn answering_then_skipping_last_completes() {
        let now = Utc::now();
        let mut s = session(2, None, now);
        s.select_option("B", now).unwrap();
        s.check(now).unwrap();
        s.next(now).unwrap();
        s.skip(now).unwrap();

        assert!(s.is_complete());
        let summary = s.summary().unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.accuracy, 100.0);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn checking_last_question_completes() {
        let now = Utc::now();
        let mut s = session(3, None, now);
        for option in ["B", "A", "B"] {
            s.select_option(option, now).unwrap();
            let outcome = s.check(now).unwrap();
            if !outcome.session_complete {
                s.next(now).unwrap();
            }
        }
        assert!(s.is_complete());
        assert_eq!(s.next(now).unwrap_err(), SessionError::Complete);

        let summary = s.summary().unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.accuracy, 66.7);
        assert_eq!(summary.time_spent_seconds, 0);
    }

    #[test]
    fn summary_waits_for_completion() {
        let now = Utc::now();
        let s = session(2, None, now);
        assert_eq!(s.summary().unwrap_err(), SessionError::InProgress);
    }

    #[test]
    fn retry_replays_same_order_with_fresh_log() {
        let now = Utc::now();
        let mut s = session(2, None, now);
        let order = s.problem_ids();
        s.select_option("B", now).unwrap();
        s.check(now).unwrap();
        s.next(now).unwrap();
        s.skip(now).unwrap();

        s.retry(now).unwrap();
        assert!(!s.is_complete());
        assert_eq!(s.index(), 0);
        assert!(s.results().is_empty());
        assert_eq!(s.skipped(), 0);
        assert_eq!(s.problem_ids(), order);
    }

    #[test]
    fn retry_requires_completion() {
        let now = Utc::now();
        let mut s = session(2, None, now);
        assert_eq!(s.retry(now).unwrap_err(), SessionError::InProgress);
    }

    #[test]
    fn disabled_timer_never_expires() {
        let now = Utc::now();
        let mut s = session(1, None, now);
        assert_eq!(s.deadline(), None);
        assert!(s.tick(now + Duration::hours(5)).is_none());
        assert!(!s.is_complete());
    }

    #[test]
    fn timer_expiry_grades_current_selection() {
        let start = Utc::now();
        let mut s = session(2, Some(30), start);
        s.select_option("B", start + Duration::seconds(5)).unwrap();

        assert!(s.tick(start + Duration::seconds(29)).is_none());
        assert_eq!(s.remaining_seconds(start + Duration::seconds(29)), Some(1));

        let outcome = s.tick(start + Duration::seconds(30)).unwrap();
        assert!(outcome.timed_out);
        assert!(outcome.grade.is_correct);
        assert_eq!(s.results()[0].time_spent_seconds, 30);
        assert_eq!(s.deadline(), None);
        assert!(s.tick(start + Duration::seconds(90)).is_none());
    }

    #[test]
    fn timer_expiry_without_selection_is_incorrect() {
        let start = Utc::now();
        let mut s = session(1, Some(10), start);
        let outcome = s.tick(start + Duration::seconds(12)).unwrap();
        assert!(!outcome.grade.is_correct);
        assert!(outcome.session_complete);
        assert_eq!(s.results()[0].selected_option_id, None);
        assert_eq!(s.results()[0].time_spent_seconds, 10);
    }

    #[test]
    fn timer_restarts_on_next_question() {
        let start = Utc::now();
        let mut s = session(2, Some(20), start);
        s.select_option("B", start + Duration::seconds(4)).unwrap();
        s.check(start + Duration::seconds(6)).unwrap();
        assert_eq!(s.results()[0].time_spent_seconds, 6);

        let later = start + Duration::seconds(100);
        assert!(s.tick(later).is_none());
        s.next(later).unwrap();
        assert_eq!(s.remaining_seconds(later), Some(20));
    }

    #[test]
    fn registry_records_progress_on_check() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let id = registry.insert(session(2, None, now));

        let mut recorder = MockProgressRecorder::new();
        recorder
            .expect_record()
            .withf(|user, problem, status| {
                user == "u1" && problem == "p0" && *status == ProgressStatus::Completed
            })
            .times(1)
            .return_const(());

        registry
            .with_session("u1", id, now, &recorder, |s| Ok(s.select_option("B", now)?))
            .unwrap();
        let outcome = registry.check("u1", id, now, &recorder).unwrap();
        assert!(outcome.grade.is_correct);
    }

    #[test]
    fn registry_records_in_progress_on_wrong_answer() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let id = registry.insert(session(1, None, now));

        let mut recorder = MockProgressRecorder::new();
        recorder
            .expect_record()
            .withf(|_, problem, status| problem == "p0" && *status == ProgressStatus::InProgress)
            .times(1)
            .return_const(());

        registry
            .with_session("u1", id, now, &recorder, |s| Ok(s.select_option("C", now)?))
            .unwrap();
        registry.check("u1", id, now, &recorder).unwrap();
    }

    #[test]
    fn skip_never_touches_progress() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let id = registry.insert(session(2, None, now));

        let mut recorder = MockProgressRecorder::new();
        recorder.expect_record().times(0);

        registry
            .with_session("u1", id, now, &recorder, |s| Ok(s.skip(now)?))
            .unwrap();
        registry
            .with_session("u1", id, now, &recorder, |s| Ok(s.skip(now)?))
            .unwrap();
        let complete = registry
            .with_session("u1", id, now, &recorder, |s| Ok(s.is_complete()))
            .unwrap();
        assert!(complete);
    }

    #[test]
    fn failed_check_records_nothing() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let id = registry.insert(session(1, None, now));

        let mut recorder = MockProgressRecorder::new();
        recorder.expect_record().times(0);

        let err = registry.check("u1", id, now, &recorder).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn sessions_are_private_to_their_user() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let id = registry.insert(session(1, None, now));
        let recorder = MockProgressRecorder::new();

        let result = registry.with_session("intruder", id, now, &recorder, |_| Ok(()));
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(matches!(registry.remove("intruder", id), Err(Error::NotFound(_))));
        registry.remove("u1", id).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn tick_all_expires_due_timers() {
        let registry = SessionRegistry::new();
        let start = Utc::now();
        registry.insert(session(2, Some(15), start));
        registry.insert(session(2, None, start));

        let mut recorder = MockProgressRecorder::new();
        recorder
            .expect_record()
            .withf(|_, _, status| *status == ProgressStatus::InProgress)
            .times(1)
            .return_const(());

        assert_eq!(registry.tick_all(start + Duration::seconds(5), &recorder), 0);
        assert_eq!(registry.tick_all(start + Duration::seconds(15), &recorder), 1);
        assert_eq!(registry.tick_all(start + Duration::seconds(16), &recorder), 0);
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let registry = SessionRegistry::new();
        let start = Utc::now();
        registry.insert(session(1, None, start));
        let recent = registry.insert(session(1, None, start + Duration::minutes(90)));

        assert_eq!(registry.evict_idle(start + Duration::minutes(60)), 1);
        assert_eq!(registry.len(), 1);
        let recorder = MockProgressRecorder::new();
        registry
            .with_session("u1", recent, start + Duration::minutes(91), &recorder, |_| Ok(()))
            .unwrap();
    }

    fn hinted(n: usize, show_hints: bool, now: DateTime<Utc>) -> QuizSession {
        let problems: Vec<Problem> = problems(n)
            .into_iter()
            .map(|mut p| {
                p.key_insight = Some(format!("insight for {}", p.id));
                p
            })
            .collect();
        let mut config = config(&problems, None);
        config.show_hints = show_hints;
        QuizSession::start("u1", config, problems, now).unwrap()
    }

    #[test]
    fn hint_stays_hidden_until_requested() {
        let now = Utc::now();
        let mut s = hinted(2, false, now);
        assert_eq!(s.visible_hint(), None);

        s.select_option("A", now).unwrap();
        assert_eq!(s.request_hint(now).unwrap(), Some("insight for p0"));
        assert_eq!(s.visible_hint(), Some("insight for p0"));
        assert_eq!(
            s.state(),
            &QuestionState::OptionSelected {
                option_id: "A".to_string()
            }
        );

        s.check(now).unwrap();
        s.next(now).unwrap();
        assert_eq!(s.visible_hint(), None);
        s.select_option("B", now).unwrap();
        s.check(now).unwrap();
        assert_eq!(s.visible_hint(), Some("insight for p1"));
    }

    #[test]
    fn automatic_hints_need_no_request() {
        let now = Utc::now();
        let s = hinted(1, true, now);
        assert_eq!(s.visible_hint(), Some("insight for p0"));
    }

    #[test]
    fn hint_after_completion_is_rejected() {
        let now = Utc::now();
        let mut s = hinted(1, false, now);
        s.skip(now).unwrap();
        assert_eq!(s.request_hint(now).unwrap_err(), SessionError::Complete);
    }
}
