use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "insight_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Pattern,
    Recommendation,
    Achievement,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AiInsight {
    pub id: Uuid,
    pub user_id: Uuid,
    pub insight_type: InsightType,
    pub title: String,
    pub content: String,
    pub confidence_score: f64,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
