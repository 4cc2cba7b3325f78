use axum::{extract::State, Extension, Json};
use chrono::{NaiveDate, Utc};

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::daily_record::DailyRecord;
use crate::AppState;

/// Weekly summary over the last 7 days. Pure local aggregation, no AI
/// involvement, so no fallback path is needed.
pub async fn weekly_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let end = Utc::now().date_naive();
    let start = end - chrono::Duration::days(6);

    let records = sqlx::query_as::<_, DailyRecord>(
        r#"
        SELECT * FROM daily_records
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    let report = build_weekly_report(&records, start, end);
    Ok(Json(serde_json::json!({ "report": report })))
}

fn build_weekly_report(records: &[DailyRecord], start: NaiveDate, end: NaiveDate) -> String {
    let n = records.len();
    let avg = |sum: i64| -> f64 {
        if n == 0 {
            0.0
        } else {
            sum as f64 / n as f64
        }
    };

    let avg_mood = avg(records.iter().map(|r| r.mood_score as i64).sum());
    let avg_energy = avg(records.iter().map(|r| r.energy_level as i64).sum());
    let avg_productivity = avg(records.iter().map(|r| r.productivity_score as i64).sum());
    let goals_completed: i64 = records.iter().map(|r| r.goals_completed.max(0) as i64).sum();

    let highlight = if n >= 5 {
        "- Recorded most days this week — the habit is holding"
    } else if n > 0 {
        "- Kept the record habit alive; a few more entries will sharpen the picture"
    } else {
        "- No records this week — a single entry tomorrow restarts the habit"
    };

    format!(
        "# Weekly report ({start} - {end})\n\n\
         Days recorded: {n}/7\n\
         Average mood: {avg_mood:.1}/10\n\
         Average energy: {avg_energy:.1}/10\n\
         Average productivity: {avg_productivity:.1}/10\n\
         Goals completed: {goals_completed}\n\n\
         Highlights:\n{highlight}\n\n\
         Suggestion:\n- Pick one or two small, concrete goals for next week and review them daily",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(date: &str, mood: i32, energy: i32, productivity: i32, goals: i32) -> DailyRecord {
        DailyRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            date: date.parse().unwrap(),
            mood_score: mood,
            energy_level: energy,
            productivity_score: productivity,
            goals_completed: goals,
            gratitude_notes: None,
            achievements: vec![],
            challenges: vec![],
            reflections: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_report_aggregates_week() {
        let records = vec![
            record("2024-03-04", 6, 5, 7, 1),
            record("2024-03-05", 8, 7, 9, 2),
        ];
        let report =
            build_weekly_report(&records, "2024-03-04".parse().unwrap(), "2024-03-10".parse().unwrap());

        assert!(report.contains("Days recorded: 2/7"));
        assert!(report.contains("Average mood: 7.0/10"));
        assert!(report.contains("Goals completed: 3"));
    }

    #[test]
    fn test_report_handles_empty_week() {
        let report =
            build_weekly_report(&[], "2024-03-04".parse().unwrap(), "2024-03-10".parse().unwrap());

        assert!(report.contains("Days recorded: 0/7"));
        assert!(report.contains("Average mood: 0.0/10"));
        assert!(report.contains("restarts the habit"));
    }
}
