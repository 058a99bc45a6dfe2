use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::problem::QuizQuestion;
use crate::models::session::{ResultSummary, SessionResult};

pub const CORRECT_FEEDBACK: &str = "Correct! Good job!";
pub const WRONG_FEEDBACK: &str = "Wrong answer.";
pub const TIMED_OUT_FEEDBACK: &str = "Time is up.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub is_correct: bool,
    pub feedback: String,
    pub explanation: Option<String>,
    pub correct_option_id: Option<String>,
}

pub struct GradingService;

impl GradingService {
    /// Correct iff the chosen option carries the correctness flag. Wrong
    /// answers surface the option's own explanation when it has one.
    pub fn grade(question: &QuizQuestion, selected_option_id: Option<&str>) -> Grade {
        let correct_option_id = question.correct_option().map(|o| o.id.clone());
        let Some(option) = selected_option_id.and_then(|id| question.option(id)) else {
            return Grade {
                is_correct: false,
                feedback: TIMED_OUT_FEEDBACK.to_string(),
                explanation: None,
                correct_option_id,
            };
        };

        if option.is_correct {
            Grade {
                is_correct: true,
                feedback: CORRECT_FEEDBACK.to_string(),
                explanation: None,
                correct_option_id,
            }
        } else {
            let feedback = match &option.why_wrong {
                Some(why) => format!("{} {}", WRONG_FEEDBACK, why),
                None => WRONG_FEEDBACK.to_string(),
            };
            Grade {
                is_correct: false,
                feedback,
                explanation: option.why_wrong.clone(),
                correct_option_id,
            }
        }
    }

    /// Percentage rounded to one decimal place; 0.0 when nothing was graded.
    pub fn accuracy(correct: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let pct = Decimal::from(correct as u64) * Decimal::ONE_HUNDRED / Decimal::from(total as u64);
        pct.round_dp(1).to_string().parse().unwrap_or(0.0)
    }

    pub fn summarize(source_name: &str, results: &[SessionResult], skipped: usize) -> ResultSummary {
        let correct = results.iter().filter(|r| r.is_correct).count();
        ResultSummary {
            source_name: source_name.to_string(),
            total: results.len(),
            correct,
            accuracy: Self::accuracy(correct, results.len()),
            time_spent_seconds: results.iter().map(|r| r.time_spent_seconds as u64).sum(),
            skipped,
            results: results.to_vec(),
        }
    }
}
