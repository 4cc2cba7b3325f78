use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::focus_session::{
    DailyFocusMinutes, DailyMinutesQuery, FocusSession, LogFocusSessionRequest,
};
use crate::models::points::PointsSource;
use crate::services::{gamification, points_history, scoring};
use crate::AppState;

/// Log a finished focus interval. Sessions are purely additive; a successful
/// one earns the fixed manual bonus, recorded straight into the ledger.
pub async fn log_focus_session(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<LogFocusSessionRequest>,
) -> AppResult<Json<FocusSession>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let ended_at = body.ended_at.unwrap_or_else(Utc::now);
    let started_at = body
        .started_at
        .unwrap_or_else(|| ended_at - chrono::Duration::minutes(body.actual_minutes as i64));

    if ended_at < started_at {
        return Err(AppError::Validation(
            "ended_at must not precede started_at".into(),
        ));
    }

    let session = sqlx::query_as::<_, FocusSession>(
        r#"
        INSERT INTO focus_sessions
            (id, user_id, task_title, planned_minutes, actual_minutes, is_success,
             notes, started_at, ended_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.task_title)
    .bind(body.planned_minutes)
    .bind(body.actual_minutes)
    .bind(body.is_success.unwrap_or(true))
    .bind(&body.notes)
    .bind(started_at)
    .bind(ended_at)
    .fetch_one(&state.db)
    .await?;

    if session.is_success {
        points_history::append_best_effort(
            &state.db,
            auth_user.id,
            scoring::FOCUS_SESSION_POINTS,
            PointsSource::Manual,
            Some(session.id),
            Some("Focus session completed"),
        )
        .await;
        gamification::reconcile_best_effort(
            &state.db,
            auth_user.id,
            state.config.streak_lookback_days,
        )
        .await;
    }

    Ok(Json(session))
}

pub async fn today_minutes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let today = Utc::now().date_naive();

    let minutes = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(actual_minutes), 0)
        FROM focus_sessions
        WHERE user_id = $1 AND started_at::date = $2
        "#,
    )
    .bind(auth_user.id)
    .bind(today)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(serde_json::json!({
        "date": today,
        "minutes": minutes,
    })))
}

/// Per-day focus minutes for the trailing window, zero-filled for days
/// without sessions.
pub async fn daily_minutes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DailyMinutesQuery>,
) -> AppResult<Json<Vec<DailyFocusMinutes>>> {
    let days = query.days.unwrap_or(7).clamp(1, 90);
    let end = Utc::now().date_naive();
    let start = end - chrono::Duration::days(days - 1);

    let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
        r#"
        WITH days AS (
            SELECT generate_series($2::date, $3::date, '1 day'::interval)::date AS date
        )
        SELECT
            d.date,
            COALESCE(SUM(f.actual_minutes), 0)::bigint AS minutes
        FROM days d
        LEFT JOIN focus_sessions f
            ON f.user_id = $1 AND f.started_at::date = d.date
        GROUP BY d.date
        ORDER BY d.date ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    let entries = rows
        .into_iter()
        .map(|(date, minutes)| DailyFocusMinutes { date, minutes })
        .collect();

    Ok(Json(entries))
}
