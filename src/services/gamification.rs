//! Profile stats reconciliation: recompute (points, level, streak) from the
//! activity log and overwrite the cached profile row.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::{scoring, streak};

#[derive(Debug, Clone, Copy)]
pub struct ProfileStats {
    pub total_points: i32,
    pub level: i32,
    pub streak: i32,
}

/// Recompute the derived triple and write it in one statement. If any
/// sub-computation fails the write is skipped entirely; the profile is never
/// partially overwritten. Safe to call redundantly and concurrently:
/// last-write-wins on a pure cache row.
pub async fn reconcile_profile_stats(
    db: &PgPool,
    user_id: Uuid,
    streak_lookback_days: i64,
) -> AppResult<ProfileStats> {
    let today = Utc::now().date_naive();

    let streak = streak::compute_streak(db, user_id, today, streak_lookback_days).await?;
    let total_points = scoring::compute_total_points(db, user_id, streak).await?;
    let level = scoring::level_for_points(total_points);

    sqlx::query(
        r#"
        UPDATE profiles SET
            total_points = $2,
            level = $3,
            streak_count = $4,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(total_points)
    .bind(level)
    .bind(streak)
    .execute(db)
    .await?;

    Ok(ProfileStats {
        total_points,
        level,
        streak,
    })
}

/// Post-action variant: failure is logged and swallowed so the user action
/// that triggered the reconcile always completes.
pub async fn reconcile_best_effort(db: &PgPool, user_id: Uuid, streak_lookback_days: i64) {
    if let Err(e) = reconcile_profile_stats(db, user_id, streak_lookback_days).await {
        tracing::warn!(user_id = %user_id, error = %e, "Profile stats reconciliation failed");
    }
}
