//! Static achievement catalog and its side-effect-free evaluator.
//!
//! "Unlocked" is never stored: the catalog is evaluated fresh against
//! current aggregates on each request, and callers detect newly-crossed
//! thresholds by diffing against their previous evaluation.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::streak;

/// Unlock predicate, one variant per requirement kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Requirement {
    Streak(i32),
    TotalRecords(i64),
    MoodAverage { threshold: f64, window_days: i64 },
    GoalsCompleted(i64),
}

#[derive(Debug)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub points: i32,
    pub requirement: Requirement,
}

pub const CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: "first-record",
        title: "First Entry",
        description: "File your first daily record",
        icon: "🌱",
        points: 10,
        requirement: Requirement::TotalRecords(1),
    },
    AchievementDef {
        id: "week-streak",
        title: "One Week Strong",
        description: "Stay active 7 days in a row",
        icon: "📅",
        points: 50,
        requirement: Requirement::Streak(7),
    },
    AchievementDef {
        id: "half-month-streak",
        title: "Half-Month Habit",
        description: "Stay active 15 days in a row",
        icon: "🔥",
        points: 100,
        requirement: Requirement::Streak(15),
    },
    AchievementDef {
        id: "month-streak",
        title: "Full Month",
        description: "Stay active 30 days in a row",
        icon: "💎",
        points: 200,
        requirement: Requirement::Streak(30),
    },
    AchievementDef {
        id: "hundred-days",
        title: "Hundred Days of Growth",
        description: "Stay active 100 days in a row",
        icon: "🏆",
        points: 500,
        requirement: Requirement::Streak(100),
    },
    AchievementDef {
        id: "positive-week",
        title: "Positive Mind",
        description: "Average mood above 7 over the last 7 days",
        icon: "😊",
        points: 30,
        requirement: Requirement::MoodAverage {
            threshold: 7.0,
            window_days: 7,
        },
    },
    AchievementDef {
        id: "goal-getter",
        title: "Goal Getter",
        description: "Complete 100 goals",
        icon: "🎯",
        points: 150,
        requirement: Requirement::GoalsCompleted(100),
    },
    AchievementDef {
        id: "seasoned-journaler",
        title: "Seasoned Journaler",
        description: "File 50 daily records",
        icon: "📝",
        points: 100,
        requirement: Requirement::TotalRecords(50),
    },
    AchievementDef {
        id: "mood-master",
        title: "Mood Master",
        description: "Average mood above 8 over the last 30 days",
        icon: "🧘",
        points: 100,
        requirement: Requirement::MoodAverage {
            threshold: 8.0,
            window_days: 30,
        },
    },
];

/// Aggregates the evaluator consumes, assembled fresh per evaluation.
#[derive(Debug, Clone, Default)]
pub struct ActivitySnapshot {
    pub total_records: i64,
    pub streak: i32,
    pub goals_completed: i64,
    /// (date, mood_score) for records inside the widest mood window.
    pub mood_by_date: Vec<(NaiveDate, i32)>,
}

impl ActivitySnapshot {
    /// Mean mood over records dated within the trailing window, however few
    /// there are. An empty window averages 0, which can never satisfy a
    /// positive threshold.
    pub fn mood_average(&self, today: NaiveDate, window_days: i64) -> f64 {
        let start = today - Duration::days(window_days - 1);
        let scores: Vec<i32> = self
            .mood_by_date
            .iter()
            .filter(|(date, _)| *date >= start && *date <= today)
            .map(|(_, score)| *score)
            .collect();

        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AchievementStatus {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub points: i32,
    pub unlocked: bool,
}

/// Evaluate the whole catalog against a snapshot. Pure: identical input
/// yields identical output.
pub fn evaluate(snapshot: &ActivitySnapshot, today: NaiveDate) -> Vec<AchievementStatus> {
    CATALOG
        .iter()
        .map(|def| {
            let unlocked = match def.requirement {
                Requirement::Streak(n) => snapshot.streak >= n,
                Requirement::TotalRecords(n) => snapshot.total_records >= n,
                Requirement::GoalsCompleted(n) => snapshot.goals_completed >= n,
                Requirement::MoodAverage {
                    threshold,
                    window_days,
                } => snapshot.mood_average(today, window_days) >= threshold,
            };

            AchievementStatus {
                id: def.id,
                title: def.title,
                description: def.description,
                icon: def.icon,
                points: def.points,
                unlocked,
            }
        })
        .collect()
}

/// Ids unlocked now that were not in the previous evaluation's unlocked set.
pub fn newly_unlocked<'a>(
    previous: &HashSet<&str>,
    current: &'a [AchievementStatus],
) -> Vec<&'a str> {
    current
        .iter()
        .filter(|status| status.unlocked && !previous.contains(status.id))
        .map(|status| status.id)
        .collect()
}

fn widest_mood_window() -> i64 {
    CATALOG
        .iter()
        .map(|def| match def.requirement {
            Requirement::MoodAverage { window_days, .. } => window_days,
            _ => 0,
        })
        .max()
        .unwrap_or(0)
}

pub async fn snapshot_for_user(
    db: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
    streak_lookback_days: i64,
) -> AppResult<ActivitySnapshot> {
    let (total_records, goals_completed) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*), COALESCE(SUM(goals_completed), 0)
        FROM daily_records
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    let window_start = today - Duration::days((widest_mood_window() - 1).max(0));
    let mood_by_date = sqlx::query_as::<_, (NaiveDate, i32)>(
        "SELECT date, mood_score FROM daily_records WHERE user_id = $1 AND date BETWEEN $2 AND $3",
    )
    .bind(user_id)
    .bind(window_start)
    .bind(today)
    .fetch_all(db)
    .await?;

    let streak = streak::compute_streak(db, user_id, today, streak_lookback_days).await?;

    Ok(ActivitySnapshot {
        total_records,
        streak,
        goals_completed,
        mood_by_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn unlocked_ids(statuses: &[AchievementStatus]) -> Vec<&'static str> {
        statuses
            .iter()
            .filter(|s| s.unlocked)
            .map(|s| s.id)
            .collect()
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let ids: HashSet<&str> = CATALOG.iter().map(|def| def.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_empty_snapshot_unlocks_nothing() {
        let statuses = evaluate(&ActivitySnapshot::default(), d("2024-03-10"));
        assert!(unlocked_ids(&statuses).is_empty());
    }

    #[test]
    fn test_first_record_unlocks_at_one() {
        let snapshot = ActivitySnapshot {
            total_records: 1,
            ..Default::default()
        };
        let statuses = evaluate(&snapshot, d("2024-03-10"));
        assert_eq!(unlocked_ids(&statuses), vec!["first-record"]);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let snapshot = ActivitySnapshot {
            total_records: 12,
            streak: 8,
            goals_completed: 40,
            mood_by_date: vec![(d("2024-03-09"), 8), (d("2024-03-10"), 9)],
        };
        let today = d("2024-03-10");
        assert_eq!(evaluate(&snapshot, today), evaluate(&snapshot, today));
    }

    #[test]
    fn test_mood_average_over_partial_window() {
        // Two records inside the 7-day window: (8 + 9) / 2 = 8.5.
        let snapshot = ActivitySnapshot {
            mood_by_date: vec![(d("2024-03-09"), 8), (d("2024-03-10"), 9)],
            ..Default::default()
        };
        assert!((snapshot.mood_average(d("2024-03-10"), 7) - 8.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mood_average_excludes_dates_outside_window() {
        let snapshot = ActivitySnapshot {
            mood_by_date: vec![(d("2024-02-01"), 10), (d("2024-03-10"), 6)],
            ..Default::default()
        };
        assert!((snapshot.mood_average(d("2024-03-10"), 7) - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_mood_window_cannot_unlock() {
        let snapshot = ActivitySnapshot {
            total_records: 100,
            streak: 100,
            goals_completed: 100,
            mood_by_date: vec![],
        };
        let statuses = evaluate(&snapshot, d("2024-03-10"));
        let ids = unlocked_ids(&statuses);
        assert!(!ids.contains(&"positive-week"));
        assert!(!ids.contains(&"mood-master"));
    }

    #[test]
    fn test_newly_unlocked_diff() {
        let before = ActivitySnapshot {
            streak: 6,
            total_records: 6,
            ..Default::default()
        };
        let after = ActivitySnapshot {
            streak: 7,
            total_records: 7,
            ..Default::default()
        };
        let today = d("2024-03-10");

        let previous: HashSet<&str> = evaluate(&before, today)
            .iter()
            .filter(|s| s.unlocked)
            .map(|s| s.id)
            .collect();
        let current = evaluate(&after, today);

        assert_eq!(newly_unlocked(&previous, &current), vec!["week-streak"]);
    }
}
