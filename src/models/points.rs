use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "points_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PointsSource {
    Checkin,
    Record,
    Manual,
}

/// Append-only ledger row. Never updated or deleted; display/audit only.
/// The authoritative total is recomputed from the activity log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PointsHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points_delta: i32,
    pub source: PointsSource,
    pub reference_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PointsHistoryQuery {
    pub limit: Option<i64>,
}
