use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::daily_record::{DailyRecord, RecordQuery, UpsertDailyRecordRequest};
use crate::models::points::PointsSource;
use crate::services::scoring::{self, RecordScores};
use crate::services::{gamification, points_history};
use crate::AppState;

/// Create or overwrite the record for a date (at most one per user per day).
/// The ledger is credited once, on first creation; stats are reconciled on
/// every write since quality bonuses may change on resubmission.
pub async fn upsert_record(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpsertDailyRecordRequest>,
) -> AppResult<Json<DailyRecord>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let date = body.date.unwrap_or_else(|| Utc::now().date_naive());

    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM daily_records WHERE user_id = $1 AND date = $2",
    )
    .bind(auth_user.id)
    .bind(date)
    .fetch_optional(&state.db)
    .await?;

    let record = sqlx::query_as::<_, DailyRecord>(
        r#"
        INSERT INTO daily_records
            (id, user_id, date, mood_score, energy_level, productivity_score,
             goals_completed, gratitude_notes, achievements, challenges, reflections)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (user_id, date) DO UPDATE SET
            mood_score = $4,
            energy_level = $5,
            productivity_score = $6,
            goals_completed = $7,
            gratitude_notes = $8,
            achievements = $9,
            challenges = $10,
            reflections = $11,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(date)
    .bind(body.mood_score)
    .bind(body.energy_level)
    .bind(body.productivity_score)
    .bind(body.goals_completed.unwrap_or(0))
    .bind(&body.gratitude_notes)
    .bind(body.achievements.clone().unwrap_or_default())
    .bind(body.challenges.clone().unwrap_or_default())
    .bind(&body.reflections)
    .fetch_one(&state.db)
    .await?;

    if existing.is_none() {
        let reward = scoring::record_reward(&RecordScores::from(&record));
        points_history::append_best_effort(
            &state.db,
            auth_user.id,
            reward,
            PointsSource::Record,
            Some(record.id),
            Some("Daily record filed"),
        )
        .await;
    }
    gamification::reconcile_best_effort(&state.db, auth_user.id, state.config.streak_lookback_days)
        .await;

    Ok(Json(record))
}

pub async fn list_records(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<RecordQuery>,
) -> AppResult<Json<Vec<DailyRecord>>> {
    let start = query
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive() - chrono::Duration::days(30));
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());

    let records = sqlx::query_as::<_, DailyRecord>(
        r#"
        SELECT * FROM daily_records
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(records))
}

pub async fn get_record_by_date(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
) -> AppResult<Json<DailyRecord>> {
    let record = sqlx::query_as::<_, DailyRecord>(
        "SELECT * FROM daily_records WHERE user_id = $1 AND date = $2",
    )
    .bind(auth_user.id)
    .bind(date)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("No record for this date".into()))?;

    Ok(Json(record))
}
