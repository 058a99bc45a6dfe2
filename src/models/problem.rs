use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(Error::BadRequest(format!("Unknown difficulty: {}", other))),
        }
    }
}

/// One answer choice. Exactly one option per question carries `is_correct`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_wrong: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<QuizOption>,
}

impl QuizQuestion {
    pub fn option(&self, option_id: &str) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalIdea {
    #[serde(default)]
    pub one_liner: String,
}

/// A catalog item. Problems are authored outside the service and only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub topics: Vec<String>,
    pub problem_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_insight: Option<String>,
    pub canonical_idea: CanonicalIdea,
    pub pseudocode: Vec<String>,
    pub common_traps: Vec<String>,
    pub quiz: QuizQuestion,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProblemRow {
    pub id: String,
    pub position: i32,
    pub title: String,
    pub difficulty: String,
    pub topics: Vec<String>,
    pub problem_summary: String,
    pub key_insight: Option<String>,
    pub canonical_one_liner: String,
    pub pseudocode: Vec<String>,
    pub common_traps: Vec<String>,
    pub quiz: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Problem as authored in data files, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemRecord {
    pub id: String,
    pub title: String,
    pub difficulty: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub problem_summary: String,
    #[serde(default)]
    pub key_insight: Option<String>,
    #[serde(default)]
    pub canonical_idea: CanonicalIdea,
    #[serde(default, alias = "pseudo_code")]
    pub pseudocode: Vec<String>,
    #[serde(default)]
    pub common_traps: Vec<String>,
    pub quiz: RawQuiz,
}

/// Quiz payload in either historical shape: per-option flags, or plain
/// string options with a single `correct_option` literal and one
/// question-level `why_wrong`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuiz {
    pub question: String,
    pub options: Vec<RawOption>,
    #[serde(default)]
    pub correct_option: Option<RawOptionKey>,
    #[serde(default)]
    pub why_wrong: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawOption {
    Text(String),
    Record {
        #[serde(default)]
        id: Option<RawOptionKey>,
        text: String,
        #[serde(default)]
        is_correct: Option<bool>,
        #[serde(default)]
        why_wrong: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawOptionKey {
    Label(String),
    Index(u32),
}

impl RawOptionKey {
    fn into_label(self) -> String {
        match self {
            RawOptionKey::Label(label) => label,
            RawOptionKey::Index(idx) => idx.to_string(),
        }
    }

    fn matches(&self, idx: usize, option: &QuizOption) -> bool {
        match self {
            RawOptionKey::Label(label) => option.id == *label || option.text == *label,
            RawOptionKey::Index(i) => *i as usize == idx,
        }
    }
}

fn option_label(idx: usize) -> String {
    if idx < 26 {
        char::from(b'A' + idx as u8).to_string()
    } else {
        (idx + 1).to_string()
    }
}

impl RawQuiz {
    /// Collapses both historical shapes into flagged options and enforces the
    /// single-correct-option invariant.
    pub fn normalize(self, problem_id: &str) -> Result<QuizQuestion> {
        let integrity = |msg: String| Error::DataIntegrity(format!("problem {}: {}", problem_id, msg));

        if self.question.trim().is_empty() {
            return Err(integrity("quiz question text is empty".to_string()));
        }
        if self.options.len() < 2 {
            return Err(integrity(format!(
                "quiz needs at least two options, found {}",
                self.options.len()
            )));
        }

        let mut options: Vec<QuizOption> = self
            .options
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| match raw {
                RawOption::Text(text) => QuizOption {
                    id: option_label(idx),
                    text,
                    is_correct: false,
                    why_wrong: None,
                },
                RawOption::Record {
                    id,
                    text,
                    is_correct,
                    why_wrong,
                } => QuizOption {
                    id: id.map(RawOptionKey::into_label).unwrap_or_else(|| option_label(idx)),
                    text,
                    is_correct: is_correct.unwrap_or(false),
                    why_wrong: why_wrong.filter(|w| !w.trim().is_empty()),
                },
            })
            .collect();

        let mut seen = HashSet::new();
        for option in &options {
            if option.text.trim().is_empty() {
                return Err(integrity(format!("option {} has no text", option.id)));
            }
            if !seen.insert(option.id.as_str()) {
                return Err(integrity(format!("duplicate option id {}", option.id)));
            }
        }

        if !options.iter().any(|o| o.is_correct) {
            if let Some(key) = &self.correct_option {
                let position = options
                    .iter()
                    .enumerate()
                    .position(|(idx, o)| key.matches(idx, o))
                    .ok_or_else(|| integrity("correct_option matches no option".to_string()))?;
                options[position].is_correct = true;
            }
        }

        let flagged = options.iter().filter(|o| o.is_correct).count();
        if flagged != 1 {
            return Err(integrity(format!(
                "expected exactly one correct option, found {}",
                flagged
            )));
        }

        if let Some(shared) = self.why_wrong.filter(|w| !w.trim().is_empty()) {
            for option in options.iter_mut().filter(|o| !o.is_correct && o.why_wrong.is_none()) {
                option.why_wrong = Some(shared.clone());
            }
        }

        Ok(QuizQuestion {
            question: self.question,
            options,
        })
    }
}

impl TryFrom<ProblemRecord> for Problem {
    type Error = Error;

    fn try_from(record: ProblemRecord) -> Result<Self> {
        let id = record.id.trim().to_string();
        if id.is_empty() {
            return Err(Error::DataIntegrity("problem id is empty".to_string()));
        }
        if record.title.trim().is_empty() {
            return Err(Error::DataIntegrity(format!("problem {}: title is empty", id)));
        }
        let difficulty = record
            .difficulty
            .parse::<Difficulty>()
            .map_err(|_| {
                Error::DataIntegrity(format!(
                    "problem {}: unknown difficulty {:?}",
                    id, record.difficulty
                ))
            })?;
        let quiz = record.quiz.normalize(&id)?;

        Ok(Problem {
            id,
            title: record.title,
            difficulty,
            topics: record.topics,
            problem_summary: record.problem_summary,
            key_insight: record.key_insight.filter(|k| !k.trim().is_empty()),
            canonical_idea: record.canonical_idea,
            pseudocode: record.pseudocode,
            common_traps: record.common_traps,
            quiz,
        })
    }
}

impl TryFrom<ProblemRow> for Problem {
    type Error = Error;

    fn try_from(row: ProblemRow) -> Result<Self> {
        let quiz: RawQuiz = serde_json::from_value(row.quiz).map_err(|e| {
            Error::DataIntegrity(format!("problem {}: malformed quiz payload: {}", row.id, e))
        })?;
        Problem::try_from(ProblemRecord {
            id: row.id,
            title: row.title,
            difficulty: row.difficulty,
            topics: row.topics,
            problem_summary: row.problem_summary,
            key_insight: row.key_insight,
            canonical_idea: CanonicalIdea {
                one_liner: row.canonical_one_liner,
            },
            pseudocode: row.pseudocode,
            common_traps: row.common_traps,
            quiz,
        })
    }
}

/// Parses one authored problem from JSON and validates it.
pub fn parse_problem(value: JsonValue) -> Result<Problem> {
    let record: ProblemRecord = serde_json::from_value(value)
        .map_err(|e| Error::DataIntegrity(format!("malformed problem record: {}", e)))?;
    Problem::try_from(record)
}

#[cfg(test)]
pub(crate) fn fixture(id: &str, title: &str, difficulty: Difficulty, topics: &[&str]) -> Problem {
    Problem {
        id: id.to_string(),
        title: title.to_string(),
        difficulty,
        topics: topics.iter().map(|t| t.to_string()).collect(),
        problem_summary: format!("Summary of {}", title),
        key_insight: None,
        canonical_idea: CanonicalIdea {
            one_liner: "use a hash map".to_string(),
        },
        pseudocode: vec!["for each x".to_string(), "  check complement".to_string()],
        common_traps: vec!["off by one".to_string()],
        quiz: QuizQuestion {
            question: format!("Best approach for {}?", title),
            options: vec![
                QuizOption {
                    id: "A".to_string(),
                    text: "Brute force".to_string(),
                    is_correct: false,
                    why_wrong: Some("Too slow for large inputs".to_string()),
                },
                QuizOption {
                    id: "B".to_string(),
                    text: "Hash map".to_string(),
                    is_correct: true,
                    why_wrong: None,
                },
                QuizOption {
                    id: "C".to_string(),
                    text: "Sorting".to_string(),
                    is_correct: false,
                    why_wrong: None,
                },
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(quiz: JsonValue) -> JsonValue {
        json!({
            "id": "two-sum",
            "title": "Two Sum",
            "difficulty": "easy",
            "topics": ["hash_map"],
            "problem_summary": "Find two numbers adding to target",
            "canonical_idea": { "one_liner": "complement lookup" },
            "quiz": quiz,
        })
    }

    #[test]
    fn flagged_options_load() {
        let problem = parse_problem(record(json!({
            "question": "Which structure?",
            "options": [
                { "id": "a", "text": "Array", "is_correct": false, "why_wrong": "O(n^2)" },
                { "id": "b", "text": "Hash map", "is_correct": true }
            ]
        })))
        .unwrap();

        assert_eq!(problem.difficulty, Difficulty::Easy);
        assert_eq!(problem.quiz.correct_option().unwrap().id, "b");
        assert_eq!(problem.quiz.option("a").unwrap().why_wrong.as_deref(), Some("O(n^2)"));
        assert_eq!(problem.canonical_idea.one_liner, "complement lookup");
    }

    #[test]
    fn legacy_string_options_are_normalized() {
        let problem = parse_problem(record(json!({
            "question": "Which structure?",
            "options": ["Array", "Hash map", "Heap"],
            "correct_option": "Hash map"
        })))
        .unwrap();

        let ids: Vec<&str> = problem.quiz.options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(problem.quiz.correct_option().unwrap().text, "Hash map");
    }

    #[test]
    fn legacy_explanation_covers_wrong_options() {
        let problem = parse_problem(record(json!({
            "question": "Which structure?",
            "options": ["Array", "Hash map"],
            "correct_option": "Hash map",
            "why_wrong": "Because a hash map gives O(1) lookups"
        })))
        .unwrap();

        let grade = crate::services::grading_service::GradingService::grade(&problem.quiz, Some("A"));
        assert!(!grade.is_correct);
        assert_eq!(grade.explanation.as_deref(), Some("Because a hash map gives O(1) lookups"));
        assert_eq!(problem.quiz.option("B").unwrap().why_wrong, None);
    }

    #[test]
    fn option_explanation_wins_over_shared_one() {
        let problem = parse_problem(record(json!({
            "question": "Which structure?",
            "options": [
                { "id": "a", "text": "Array", "why_wrong": "Linear scan" },
                { "id": "b", "text": "Heap" },
                { "id": "c", "text": "Hash map", "is_correct": true }
            ],
            "why_wrong": "Not constant time"
        })))
        .unwrap();

        assert_eq!(problem.quiz.option("a").unwrap().why_wrong.as_deref(), Some("Linear scan"));
        assert_eq!(problem.quiz.option("b").unwrap().why_wrong.as_deref(), Some("Not constant time"));
    }

    #[test]
    fn legacy_index_literal_is_normalized() {
        let problem = parse_problem(record(json!({
            "question": "Which structure?",
            "options": ["Array", "Hash map"],
            "correct_option": 0
        })))
        .unwrap();
        assert_eq!(problem.quiz.correct_option().unwrap().id, "A");
    }

    #[test]
    fn two_correct_options_fail_fast() {
        let err = parse_problem(record(json!({
            "question": "Which structure?",
            "options": [
                { "text": "Array", "is_correct": true },
                { "text": "Hash map", "is_correct": true }
            ]
        })))
        .unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(msg) if msg.contains("found 2")));
    }

    #[test]
    fn missing_correct_option_fails_fast() {
        let err = parse_problem(record(json!({
            "question": "Which structure?",
            "options": ["Array", "Hash map"]
        })))
        .unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(_)));
    }

    #[test]
    fn unmatched_legacy_literal_fails_fast() {
        let err = parse_problem(record(json!({
            "question": "Which structure?",
            "options": ["Array", "Hash map"],
            "correct_option": "Trie"
        })))
        .unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(msg) if msg.contains("matches no option")));
    }

    #[test]
    fn malformed_option_shape_is_rejected() {
        let err = parse_problem(record(json!({
            "question": "Which structure?",
            "options": [42, { "text": "Hash map", "is_correct": true }]
        })))
        .unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(_)));
    }

    #[test]
    fn unknown_difficulty_is_rejected() {
        let mut value = record(json!({
            "question": "q",
            "options": ["a", "b"],
            "correct_option": "a"
        }));
        value["difficulty"] = json!("extreme");
        assert!(matches!(parse_problem(value), Err(Error::DataIntegrity(_))));
    }

    #[test]
    fn serialized_problem_parses_back() {
        let original = fixture("p1", "Two Sum", Difficulty::Medium, &["hash_map"]);
        let value = serde_json::to_value(&original).unwrap();
        assert_eq!(parse_problem(value).unwrap(), original);
    }
}
