use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::points::{PointsHistoryEntry, PointsHistoryQuery};
use crate::models::profile::{GamificationSummary, Profile};
use crate::services::achievements::{self, AchievementStatus};
use crate::services::{gamification, points_history, scoring};
use crate::AppState;

/// Low-stakes display read of the cached profile. Stale values are
/// acceptable here; anything that needs correctness recomputes from the
/// activity log instead.
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<GamificationSummary>> {
    let profile = get_or_create_profile(&state, auth_user.id).await?;
    let points_to_next_level = scoring::points_to_next_level(profile.total_points);

    Ok(Json(GamificationSummary {
        profile,
        points_to_next_level,
    }))
}

/// Explicit cache refresh: recompute the derived triple from the activity
/// log and overwrite the profile. Unlike the post-action reconciles this
/// surfaces failures to the caller.
pub async fn refresh_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<GamificationSummary>> {
    get_or_create_profile(&state, auth_user.id).await?;
    gamification::reconcile_profile_stats(
        &state.db,
        auth_user.id,
        state.config.streak_lookback_days,
    )
    .await?;

    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(auth_user.id)
        .fetch_one(&state.db)
        .await?;
    let points_to_next_level = scoring::points_to_next_level(profile.total_points);

    Ok(Json(GamificationSummary {
        profile,
        points_to_next_level,
    }))
}

/// Fresh, side-effect-free catalog evaluation. Callers diff the unlocked id
/// set against their previous call to surface newly-crossed thresholds.
pub async fn list_achievements(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<AchievementStatus>>> {
    let today = Utc::now().date_naive();
    let snapshot = achievements::snapshot_for_user(
        &state.db,
        auth_user.id,
        today,
        state.config.streak_lookback_days,
    )
    .await?;

    Ok(Json(achievements::evaluate(&snapshot, today)))
}

pub async fn points_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<PointsHistoryQuery>,
) -> AppResult<Json<Vec<PointsHistoryEntry>>> {
    let entries = points_history::list(&state.db, auth_user.id, query.limit).await?;
    Ok(Json(entries))
}

/// Profiles are normally created at registration; older accounts may predate
/// that, so fall back to inserting an empty row.
async fn get_or_create_profile(state: &AppState, user_id: Uuid) -> AppResult<Profile> {
    let existing = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;

    if let Some(profile) = existing {
        return Ok(profile);
    }

    sqlx::query("INSERT INTO profiles (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .execute(&state.db)
        .await?;

    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Profile not found".into()))
}
