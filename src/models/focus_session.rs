use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FocusSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_title: Option<String>,
    pub planned_minutes: i32,
    pub actual_minutes: i32,
    pub is_success: bool,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogFocusSessionRequest {
    pub task_title: Option<String>,

    #[validate(range(min = 1, message = "planned_minutes must be positive"))]
    pub planned_minutes: i32,

    #[validate(range(min = 0, message = "actual_minutes must be non-negative"))]
    pub actual_minutes: i32,

    /// Defaults to true; an abandoned session can be logged as unsuccessful.
    pub is_success: Option<bool>,
    pub notes: Option<String>,

    /// Defaults to now - actual_minutes / now when omitted.
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DailyMinutesQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DailyFocusMinutes {
    pub date: NaiveDate,
    pub minutes: i64,
}
