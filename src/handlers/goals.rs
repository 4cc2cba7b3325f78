use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::goal::{CreateGoalRequest, Goal, GoalPriority, GoalQuery, UpdateGoalRequest};
use crate::AppState;

pub async fn list_goals(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<GoalQuery>,
) -> AppResult<Json<Vec<Goal>>> {
    let goals = if let Some(status) = query.status {
        sqlx::query_as::<_, Goal>(
            r#"
            SELECT * FROM goals
            WHERE user_id = $1 AND status = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(auth_user.id)
        .bind(status)
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, Goal>(
            "SELECT * FROM goals WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(auth_user.id)
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(goals))
}

pub async fn create_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateGoalRequest>,
) -> AppResult<Json<Goal>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let goal = sqlx::query_as::<_, Goal>(
        r#"
        INSERT INTO goals (id, user_id, title, description, category, target_date, priority)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.category)
    .bind(body.target_date)
    .bind(body.priority.unwrap_or(GoalPriority::Medium))
    .fetch_one(&state.db)
    .await?;

    Ok(Json(goal))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(goal_id): Path<Uuid>,
    Json(body): Json<UpdateGoalRequest>,
) -> AppResult<Json<Goal>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Verify ownership
    let _existing =
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM goals WHERE id = $1 AND user_id = $2")
            .bind(goal_id)
            .bind(auth_user.id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(AppError::NotFound("Goal not found".into()))?;

    // Reaching 100% progress completes the goal unless the caller set a
    // status explicitly.
    let goal = sqlx::query_as::<_, Goal>(
        r#"
        UPDATE goals SET
            title = COALESCE($3, title),
            description = COALESCE($4, description),
            category = COALESCE($5, category),
            target_date = COALESCE($6, target_date),
            priority = COALESCE($7, priority),
            progress = COALESCE($8, progress),
            status = CASE
                WHEN $9::goal_status IS NOT NULL THEN $9::goal_status
                WHEN COALESCE($8, progress) >= 100 THEN 'completed'::goal_status
                ELSE status
            END,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(goal_id)
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.category)
    .bind(body.target_date)
    .bind(body.priority)
    .bind(body.progress)
    .bind(body.status)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(goal))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
        .bind(goal_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Goal not found".into()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
