//! Consecutive-day streak computation over the merged activity calendar.
//!
//! A day counts as active when the user filed a daily record OR checked in
//! on that date; focus sessions do not count. The streak is anchored to
//! `today`: a single missed day (including today itself) resets it to zero
//! regardless of how long the preceding run was.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// Pure backward walk from `today` over the active-date set. Stops at the
/// first missing date or once the lookback bound is exhausted.
pub fn consecutive_days(active: &BTreeSet<NaiveDate>, today: NaiveDate, lookback_days: i64) -> i32 {
    let mut streak: i64 = 0;
    let mut cursor = today;

    while streak < lookback_days && active.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }

    streak as i32
}

/// Union of record dates and check-in dates inside `[start, end]`.
pub async fn active_dates(
    db: &PgPool,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<BTreeSet<NaiveDate>> {
    let record_dates = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT date FROM daily_records WHERE user_id = $1 AND date BETWEEN $2 AND $3",
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;

    let checkin_dates = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT date FROM daily_checkins WHERE user_id = $1 AND date BETWEEN $2 AND $3",
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;

    Ok(record_dates.into_iter().chain(checkin_dates).collect())
}

/// Current streak ending today. `lookback_days` bounds both the query window
/// and the reported streak; store errors propagate so a failed computation
/// is never mistaken for a legitimate zero.
pub async fn compute_streak(
    db: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
    lookback_days: i64,
) -> AppResult<i32> {
    let start = today - Duration::days(lookback_days);
    let active = active_dates(db, user_id, start, today).await?;
    Ok(consecutive_days(&active, today, lookback_days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn dates(days: &[&str]) -> BTreeSet<NaiveDate> {
        days.iter().map(|s| d(s)).collect()
    }

    #[test]
    fn test_three_consecutive_days() {
        let active = dates(&["2024-03-10", "2024-03-09", "2024-03-08"]);
        assert_eq!(consecutive_days(&active, d("2024-03-10"), 60), 3);
    }

    #[test]
    fn test_missed_today_resets_to_zero() {
        // Activity yesterday and the day before, none today.
        let active = dates(&["2024-03-09", "2024-03-08"]);
        assert_eq!(consecutive_days(&active, d("2024-03-10"), 60), 0);
    }

    #[test]
    fn test_no_activity() {
        assert_eq!(consecutive_days(&BTreeSet::new(), d("2024-03-10"), 60), 0);
    }

    #[test]
    fn test_earlier_runs_do_not_count_past_a_gap() {
        // A long run ending 2024-03-07 is cut off by the missing 2024-03-08.
        let active = dates(&[
            "2024-03-10",
            "2024-03-09",
            "2024-03-07",
            "2024-03-06",
            "2024-03-05",
            "2024-03-04",
        ]);
        assert_eq!(consecutive_days(&active, d("2024-03-10"), 60), 2);
    }

    #[test]
    fn test_streak_is_capped_by_lookback() {
        let today = d("2024-03-10");
        let active: BTreeSet<NaiveDate> = (0i64..30).map(|i| today - Duration::days(i)).collect();
        assert_eq!(consecutive_days(&active, today, 7), 7);
    }

    #[test]
    fn test_merged_sources_bridge_gaps() {
        // Records on two days, a check-in bridging the middle day.
        let active = dates(&["2024-03-10", "2024-03-09", "2024-03-08"]);
        assert_eq!(consecutive_days(&active, d("2024-03-10"), 60), 3);

        let without_bridge = dates(&["2024-03-10", "2024-03-08"]);
        assert_eq!(consecutive_days(&without_bridge, d("2024-03-10"), 60), 1);
    }
}
