use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::checkin::{CheckIn, CheckInQuery, CheckInResponse};
use crate::models::points::PointsSource;
use crate::services::{gamification, points_history, scoring};
use crate::AppState;

/// Idempotent daily check-in. The existence check is an optimization; the
/// (user_id, date) unique constraint is the authoritative guard, so a
/// concurrent double-fire loses the conflict and reports created = false.
pub async fn check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<CheckInResponse>> {
    let today = Utc::now().date_naive();

    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM daily_checkins WHERE user_id = $1 AND date = $2",
    )
    .bind(auth_user.id)
    .bind(today)
    .fetch_optional(&state.db)
    .await?;

    if existing.is_some() {
        return Ok(Json(CheckInResponse {
            created: false,
            date: today,
        }));
    }

    let id = Uuid::new_v4();
    let inserted = sqlx::query(
        r#"
        INSERT INTO daily_checkins (id, user_id, date)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, date) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(auth_user.id)
    .bind(today)
    .execute(&state.db)
    .await?
    .rows_affected()
        > 0;

    if inserted {
        points_history::append_best_effort(
            &state.db,
            auth_user.id,
            scoring::CHECKIN_POINTS,
            PointsSource::Checkin,
            Some(id),
            Some("Daily check-in"),
        )
        .await;
    }
    gamification::reconcile_best_effort(&state.db, auth_user.id, state.config.streak_lookback_days)
        .await;

    Ok(Json(CheckInResponse {
        created: inserted,
        date: today,
    }))
}

/// Sign-in / session-restore trigger: check in for today if not already done,
/// then refresh the cached stats. Each step is isolated so none of them can
/// fail the authentication that triggered it.
pub(crate) async fn ensure_daily_checkin(state: &AppState, user_id: Uuid) {
    let today = Utc::now().date_naive();
    let id = Uuid::new_v4();

    match sqlx::query(
        r#"
        INSERT INTO daily_checkins (id, user_id, date)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, date) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(today)
    .execute(&state.db)
    .await
    {
        Ok(result) if result.rows_affected() > 0 => {
            points_history::append_best_effort(
                &state.db,
                user_id,
                scoring::CHECKIN_POINTS,
                PointsSource::Checkin,
                Some(id),
                Some("Daily check-in"),
            )
            .await;
        }
        Ok(_) => {} // already checked in today
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Auto check-in failed");
        }
    }

    gamification::reconcile_best_effort(&state.db, user_id, state.config.streak_lookback_days)
        .await;
}

pub async fn today_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let today = Utc::now().date_naive();

    let checked_in = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM daily_checkins WHERE user_id = $1 AND date = $2",
    )
    .bind(auth_user.id)
    .bind(today)
    .fetch_one(&state.db)
    .await?
        > 0;

    Ok(Json(serde_json::json!({
        "date": today,
        "checked_in": checked_in,
    })))
}

pub async fn list_checkins(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CheckInQuery>,
) -> AppResult<Json<Vec<CheckIn>>> {
    let start = query
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive() - chrono::Duration::days(30));
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());

    let checkins = sqlx::query_as::<_, CheckIn>(
        r#"
        SELECT * FROM daily_checkins
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(checkins))
}
