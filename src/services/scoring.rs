//! Point accumulation and level derivation.
//!
//! The total is always recomputed from the full activity log; the cached
//! profile value is display-only and never feeds back into scoring. Manual
//! awards (focus sessions) live only in the points ledger and are summed
//! from there.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::daily_record::DailyRecord;

pub const RECORD_BASE_POINTS: i32 = 5;
pub const CHECKIN_POINTS: i32 = 2;
/// Block bonus per complete week of the current streak.
pub const STREAK_WEEK_BONUS: i32 = 20;
pub const QUALITY_THRESHOLD: i32 = 8;
pub const QUALITY_BONUS: i32 = 2;
pub const GOAL_BONUS: i32 = 3;
pub const FOCUS_SESSION_POINTS: i32 = 5;
pub const POINTS_PER_LEVEL: i32 = 100;

/// The scoring-relevant slice of a daily record.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct RecordScores {
    pub mood_score: i32,
    pub energy_level: i32,
    pub productivity_score: i32,
    pub goals_completed: i32,
}

impl From<&DailyRecord> for RecordScores {
    fn from(r: &DailyRecord) -> Self {
        Self {
            mood_score: r.mood_score,
            energy_level: r.energy_level,
            productivity_score: r.productivity_score,
            goals_completed: r.goals_completed,
        }
    }
}

/// Points a single daily record contributes: flat base, a quality bonus per
/// high score, and a per-goal bonus. Historical rows may predate validation;
/// negative goal counts are treated as zero rather than rejected.
pub fn record_reward(r: &RecordScores) -> i32 {
    let mut points = RECORD_BASE_POINTS;

    if r.mood_score >= QUALITY_THRESHOLD {
        points += QUALITY_BONUS;
    }
    if r.energy_level >= QUALITY_THRESHOLD {
        points += QUALITY_BONUS;
    }
    if r.productivity_score >= QUALITY_THRESHOLD {
        points += QUALITY_BONUS;
    }

    points + r.goals_completed.max(0) * GOAL_BONUS
}

/// Milestone bonus computed once against the current streak, not accrued
/// per day. Resets when the streak resets.
pub fn streak_milestone_bonus(streak: i32) -> i32 {
    (streak.max(0) / 7) * STREAK_WEEK_BONUS
}

/// Pure accumulation over the pre-fetched activity log.
pub fn total_points(
    records: &[RecordScores],
    checkin_count: i64,
    manual_total: i64,
    streak: i32,
) -> i32 {
    let mut points: i64 = 0;

    for r in records {
        points += record_reward(r) as i64;
    }
    points += checkin_count.max(0) * CHECKIN_POINTS as i64;
    points += streak_milestone_bonus(streak) as i64;
    points += manual_total;

    points.clamp(0, i32::MAX as i64) as i32
}

pub fn level_for_points(points: i32) -> i32 {
    points.max(0) / POINTS_PER_LEVEL + 1
}

pub fn points_to_next_level(points: i32) -> i32 {
    level_for_points(points) * POINTS_PER_LEVEL - points.max(0)
}

/// Recompute the user's total from scratch. `streak` is the current unified
/// streak; it feeds only the milestone component.
pub async fn compute_total_points(db: &PgPool, user_id: Uuid, streak: i32) -> AppResult<i32> {
    let records = sqlx::query_as::<_, RecordScores>(
        r#"
        SELECT mood_score, energy_level, productivity_score, goals_completed
        FROM daily_records
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let checkin_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM daily_checkins WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;

    let manual_total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(points_delta), 0)
        FROM points_history
        WHERE user_id = $1 AND source = 'manual'
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    Ok(total_points(&records, checkin_count, manual_total, streak))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(mood: i32, energy: i32, productivity: i32, goals: i32) -> RecordScores {
        RecordScores {
            mood_score: mood,
            energy_level: energy,
            productivity_score: productivity,
            goals_completed: goals,
        }
    }

    #[test]
    fn test_level_derivation() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(250), 3);
    }

    #[test]
    fn test_points_to_next_level() {
        assert_eq!(points_to_next_level(0), 100);
        assert_eq!(points_to_next_level(99), 1);
        assert_eq!(points_to_next_level(100), 100);
        assert_eq!(points_to_next_level(250), 50);
    }

    #[test]
    fn test_record_reward_high_quality() {
        // Base 5 + three quality bonuses + 2 goals * 3.
        assert_eq!(record_reward(&record(9, 9, 9, 2)), 17);
    }

    #[test]
    fn test_record_reward_threshold_is_inclusive() {
        assert_eq!(record_reward(&record(8, 7, 7, 0)), 7);
    }

    #[test]
    fn test_record_reward_tolerates_bad_history() {
        // Out-of-range scores and negative goal counts never panic; the
        // negative count is ignored.
        assert_eq!(record_reward(&record(15, -3, 0, -4)), 7);
    }

    #[test]
    fn test_streak_milestone_bonus() {
        assert_eq!(streak_milestone_bonus(0), 0);
        assert_eq!(streak_milestone_bonus(6), 0);
        assert_eq!(streak_milestone_bonus(7), 20);
        assert_eq!(streak_milestone_bonus(14), 40);
        assert_eq!(streak_milestone_bonus(-5), 0);
    }

    #[test]
    fn test_total_grows_by_exactly_the_record_reward() {
        let mut log = vec![record(5, 5, 5, 0), record(7, 8, 6, 1)];
        let before = total_points(&log, 4, 0, 3);

        log.push(record(9, 9, 9, 2));
        let after = total_points(&log, 4, 0, 3);

        assert_eq!(after - before, 17);
    }

    #[test]
    fn test_total_includes_all_sources() {
        let log = vec![record(9, 9, 9, 2)]; // 17
        // 17 + 3 check-ins * 2 + two-week milestone 40 + manual 5 = 68
        assert_eq!(total_points(&log, 3, 5, 14), 68);
    }

    #[test]
    fn test_milestone_component_shrinks_when_streak_resets() {
        let log = vec![record(5, 5, 5, 0)];
        let with_streak = total_points(&log, 0, 0, 14);
        let reset = total_points(&log, 0, 0, 0);
        assert_eq!(with_streak - reset, 40);
    }
}
