use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One self-assessment per (user, calendar date). Resubmitting for the same
/// date upserts the existing row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub mood_score: i32,
    pub energy_level: i32,
    pub productivity_score: i32,
    pub goals_completed: i32,
    pub gratitude_notes: Option<String>,
    pub achievements: Vec<String>,
    pub challenges: Vec<String>,
    pub reflections: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertDailyRecordRequest {
    /// Defaults to today when omitted.
    pub date: Option<NaiveDate>,

    #[validate(range(min = 1, max = 10, message = "mood_score must be between 1 and 10"))]
    pub mood_score: i32,

    #[validate(range(min = 1, max = 10, message = "energy_level must be between 1 and 10"))]
    pub energy_level: i32,

    #[validate(range(
        min = 1,
        max = 10,
        message = "productivity_score must be between 1 and 10"
    ))]
    pub productivity_score: i32,

    #[validate(range(min = 0, message = "goals_completed must be non-negative"))]
    pub goals_completed: Option<i32>,

    pub gratitude_notes: Option<String>,
    pub achievements: Option<Vec<String>>,
    pub challenges: Option<Vec<String>>,
    pub reflections: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
