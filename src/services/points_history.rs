//! Append-only points ledger.
//!
//! Display/audit trail only: the authoritative total is recomputed from the
//! activity log (the `manual` source is the one exception, summed directly
//! by the accumulator). Writes are best-effort from the caller's view; a
//! failed append never rolls back or fails the action that earned the
//! points.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::points::{PointsHistoryEntry, PointsSource};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 200;

pub async fn append(
    db: &PgPool,
    user_id: Uuid,
    delta: i32,
    source: PointsSource,
    reference_id: Option<Uuid>,
    note: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO points_history (id, user_id, points_delta, source, reference_id, note)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(delta)
    .bind(source)
    .bind(reference_id)
    .bind(note)
    .execute(db)
    .await?;

    Ok(())
}

/// Fire-and-forget append with logged failure.
pub async fn append_best_effort(
    db: &PgPool,
    user_id: Uuid,
    delta: i32,
    source: PointsSource,
    reference_id: Option<Uuid>,
    note: Option<&str>,
) {
    if let Err(e) = append(db, user_id, delta, source, reference_id, note).await {
        tracing::warn!(
            user_id = %user_id,
            delta = delta,
            error = %e,
            "Failed to append points history entry"
        );
    }
}

/// Most recent entries first. The limit is clamped; no pagination cursor.
pub async fn list(
    db: &PgPool,
    user_id: Uuid,
    limit: Option<i64>,
) -> AppResult<Vec<PointsHistoryEntry>> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);

    let entries = sqlx::query_as::<_, PointsHistoryEntry>(
        r#"
        SELECT * FROM points_history
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(entries)
}
