use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizSet {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub problem_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}
