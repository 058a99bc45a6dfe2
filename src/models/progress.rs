use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotAttempted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotAttempted => "not_attempted",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }

    /// Status written after grading one answer.
    pub fn after_grading(is_correct: bool) -> Self {
        if is_correct {
            ProgressStatus::Completed
        } else {
            ProgressStatus::InProgress
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "not_attempted" => Ok(ProgressStatus::NotAttempted),
            "in_progress" => Ok(ProgressStatus::InProgress),
            "completed" => Ok(ProgressStatus::Completed),
            other => Err(Error::DataIntegrity(format!("unknown progress status {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProgressRow {
    pub user_id: String,
    pub problem_id: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressRecord {
    pub problem_id: String,
    pub status: ProgressStatus,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProgressRow> for ProgressRecord {
    type Error = Error;

    fn try_from(row: ProgressRow) -> Result<Self> {
        Ok(ProgressRecord {
            problem_id: row.problem_id,
            status: row.status.parse()?,
            updated_at: row.updated_at,
        })
    }
}
