use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Cached gamification summary. The derived fields (total_points, level,
/// streak_count) are a display cache overwritten by the reconciler; they are
/// never used as inputs to further computation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub total_points: i32,
    pub level: i32,
    pub streak_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct GamificationSummary {
    #[serde(flatten)]
    pub profile: Profile,
    pub points_to_next_level: i32,
}
