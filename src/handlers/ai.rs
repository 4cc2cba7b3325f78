use axum::{extract::State, Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::daily_record::DailyRecord;
use crate::models::goal::{Goal, GoalPriority, GoalStatus};
use crate::models::insight::{AiInsight, InsightType};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub insights: Vec<AiInsight>,
    pub recommendations: Vec<String>,
    pub patterns: Vec<String>,
    pub source: String, // "ai" or "fallback"
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: String,
    pub source: String,
}

/// Shape the model is asked to return, and the shape the local fallback
/// produces.
#[derive(Debug, Deserialize)]
struct Analysis {
    insights: Vec<NewInsight>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NewInsight {
    #[serde(rename = "type")]
    insight_type: InsightType,
    title: String,
    content: String,
    #[serde(default)]
    confidence: f64,
}

/// Analyze the last two weeks of records. The AI call is bounded by the
/// configured timeout; on a missing credential, timeout, error response, or
/// malformed payload the deterministic fallback is served instead. This
/// endpoint never surfaces an AI failure to the client.
pub async fn analyze(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<AnalyzeResponse>> {
    let today = Utc::now().date_naive();
    let start = today - chrono::Duration::days(13);

    let records = sqlx::query_as::<_, DailyRecord>(
        r#"
        SELECT * FROM daily_records
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(today)
    .fetch_all(&state.db)
    .await?;

    if records.is_empty() {
        return Ok(Json(AnalyzeResponse {
            insights: vec![],
            recommendations: vec![
                "File a few daily records first — analysis needs some history to work with."
                    .into(),
            ],
            patterns: vec![],
            source: "fallback".into(),
        }));
    }

    let (analysis, source) = if state.config.ai_enabled() {
        match call_ai(&state, &build_analysis_prompt(&records)).await {
            Ok(text) => match parse_analysis(&text) {
                Ok(analysis) => (analysis, "ai"),
                Err(e) => {
                    tracing::warn!(error = %e, "AI analysis payload malformed, using fallback");
                    (fallback_analysis(&records), "fallback")
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "AI analysis call failed, using fallback");
                (fallback_analysis(&records), "fallback")
            }
        }
    } else {
        (fallback_analysis(&records), "fallback")
    };

    let mut saved = Vec::with_capacity(analysis.insights.len());
    for insight in &analysis.insights {
        let row = sqlx::query_as::<_, AiInsight>(
            r#"
            INSERT INTO ai_insights (id, user_id, insight_type, title, content, confidence_score)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(auth_user.id)
        .bind(insight.insight_type)
        .bind(&insight.title)
        .bind(&insight.content)
        .bind(insight.confidence.clamp(0.0, 1.0))
        .fetch_one(&state.db)
        .await?;
        saved.push(row);
    }

    Ok(Json(AnalyzeResponse {
        insights: saved,
        recommendations: analysis.recommendations,
        patterns: analysis.patterns,
        source: source.into(),
    }))
}

/// Generate a plan for today from the last week of records and the user's
/// active goals, with the same never-fail fallback contract as `analyze`.
pub async fn plan(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<PlanResponse>> {
    let today = Utc::now().date_naive();
    let start = today - chrono::Duration::days(6);

    let records = sqlx::query_as::<_, DailyRecord>(
        r#"
        SELECT * FROM daily_records
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(today)
    .fetch_all(&state.db)
    .await?;

    if records.is_empty() {
        return Ok(Json(PlanResponse {
            plan: starter_plan(),
            source: "fallback".into(),
        }));
    }

    let goals = sqlx::query_as::<_, Goal>(
        r#"
        SELECT * FROM goals
        WHERE user_id = $1 AND status = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(GoalStatus::Active)
    .fetch_all(&state.db)
    .await?;

    if !state.config.ai_enabled() {
        return Ok(Json(PlanResponse {
            plan: build_local_plan(&records, &goals, today),
            source: "fallback".into(),
        }));
    }

    match call_ai(&state, &build_plan_prompt(&records, &goals)).await {
        Ok(text) if !text.trim().is_empty() => Ok(Json(PlanResponse {
            plan: text,
            source: "ai".into(),
        })),
        Ok(_) => Ok(Json(PlanResponse {
            plan: build_local_plan(&records, &goals, today),
            source: "fallback".into(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "AI plan call failed, using local plan");
            Ok(Json(PlanResponse {
                plan: build_local_plan(&records, &goals, today),
                source: "fallback".into(),
            }))
        }
    }
}

/// One round-trip to the AI service. The client-level timeout is the
/// cancellation boundary: once it fires the in-flight response is dropped,
/// never applied.
async fn call_ai(state: &AppState, prompt: &str) -> Result<String, anyhow::Error> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(state.config.ai_timeout_secs))
        .build()?;

    let url = format!(
        "{}/v1/messages",
        state.config.ai_base_url.trim_end_matches('/')
    );

    let response = client
        .post(&url)
        .header("x-api-key", &state.config.ai_api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&serde_json::json!({
            "model": state.config.ai_model,
            "max_tokens": 1024,
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("AI API error {}: {}", status, body);
    }

    let payload: serde_json::Value = response.json().await?;
    let text = payload["content"][0]["text"].as_str().unwrap_or_default();
    if text.is_empty() {
        anyhow::bail!("AI API returned an empty completion");
    }
    Ok(text.to_string())
}

fn build_analysis_prompt(records: &[DailyRecord]) -> String {
    let data: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "date: {} | mood {}/10 | energy {}/10 | productivity {}/10 | goals completed: {} | gratitude: {} | reflections: {}",
                r.date,
                r.mood_score,
                r.energy_level,
                r.productivity_score,
                r.goals_completed,
                r.gratitude_notes.as_deref().unwrap_or("-"),
                r.reflections.as_deref().unwrap_or("-"),
            )
        })
        .collect();

    format!(
        r#"You are a personal-growth coaching AI. Analyze this user's daily records and provide insights.

Records:
{}

Respond with JSON only, using this exact schema:
{{
  "insights": [
    {{
      "type": "pattern|recommendation|achievement|warning",
      "title": "short title",
      "content": "detailed content",
      "confidence": 0.8
    }}
  ],
  "recommendations": ["suggestion 1", "suggestion 2"],
  "patterns": ["pattern 1", "pattern 2"]
}}

Focus on mood/energy/productivity trends, behavioral patterns, actionable
improvements, and progress worth celebrating."#,
        data.join("\n")
    )
}

fn build_plan_prompt(records: &[DailyRecord], goals: &[Goal]) -> String {
    let avg = averages(records);
    let goals_list = if goals.is_empty() {
        "no active goals".to_string()
    } else {
        goals
            .iter()
            .map(|g| format!("{} ({}, {}% done)", g.title, g.category, g.progress))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        r#"Based on the user's recent history and current goals, draft a personalized plan for today.

Recent averages (last {} days): mood {:.1}/10, energy {:.1}/10, productivity {:.1}/10.
Active goals: {}

Provide a structured plan covering priority tasks, a suggested schedule,
concrete mood/energy boosters, and things to watch out for. Keep it
realistic for a single day."#,
        records.len(),
        avg.mood,
        avg.energy,
        avg.productivity,
        goals_list,
    )
}

struct Averages {
    mood: f64,
    energy: f64,
    productivity: f64,
    goals_completed: i64,
}

fn averages(records: &[DailyRecord]) -> Averages {
    let n = records.len().max(1) as f64;
    Averages {
        mood: records.iter().map(|r| r.mood_score as f64).sum::<f64>() / n,
        energy: records.iter().map(|r| r.energy_level as f64).sum::<f64>() / n,
        productivity: records
            .iter()
            .map(|r| r.productivity_score as f64)
            .sum::<f64>()
            / n,
        goals_completed: records
            .iter()
            .map(|r| r.goals_completed.max(0) as i64)
            .sum(),
    }
}

/// Parse the model's JSON, tolerating a Markdown code fence around it.
fn parse_analysis(text: &str) -> Result<Analysis, anyhow::Error> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    Ok(serde_json::from_str(body.trim())?)
}

/// Deterministic analysis assembled from local aggregates. Served whenever
/// the AI credential is missing or the call fails.
fn fallback_analysis(records: &[DailyRecord]) -> Analysis {
    let avg = averages(records);
    let mut insights = vec![NewInsight {
        insight_type: InsightType::Pattern,
        title: "Two-week overview".into(),
        content: format!(
            "Across {} records: mood averaged {:.1}/10, energy {:.1}/10, productivity {:.1}/10, with {} goals completed.",
            records.len(),
            avg.mood,
            avg.energy,
            avg.productivity,
            avg.goals_completed,
        ),
        confidence: 0.9,
    }];

    if avg.mood < 6.0 {
        insights.push(NewInsight {
            insight_type: InsightType::Warning,
            title: "Mood has been low".into(),
            content: format!(
                "Average mood was {:.1}/10 over this period. Consider scheduling one restorative activity per day and noting what precedes the dips.",
                avg.mood,
            ),
            confidence: 0.8,
        });
    } else if avg.productivity >= 7.0 {
        insights.push(NewInsight {
            insight_type: InsightType::Achievement,
            title: "Strong productive stretch".into(),
            content: format!(
                "Productivity averaged {:.1}/10 — whatever routine you are running, it is working. Worth writing down what made it stick.",
                avg.productivity,
            ),
            confidence: 0.8,
        });
    } else {
        insights.push(NewInsight {
            insight_type: InsightType::Recommendation,
            title: "Keep the record habit going".into(),
            content: "Consistent records sharpen every later analysis. Aim for a short entry even on busy days.".into(),
            confidence: 0.8,
        });
    }

    let mut recommendations = Vec::new();
    if avg.energy < 6.0 {
        recommendations
            .push("Front-load demanding work while energy is highest, and take short walking breaks.".into());
    }
    recommendations.push("Break one larger goal into steps you can finish today.".into());
    recommendations.push("End the day with a two-line reflection while it is fresh.".into());

    let patterns = vec![format!(
        "Recorded {} of the last 14 days",
        records.len().min(14)
    )];

    Analysis {
        insights,
        recommendations,
        patterns,
    }
}

fn priority_label(priority: GoalPriority) -> &'static str {
    match priority {
        GoalPriority::Low => "low",
        GoalPriority::Medium => "medium",
        GoalPriority::High => "high",
    }
}

/// Deterministic plan used when no AI credential is configured or the call
/// fails. Pure function of its inputs.
fn build_local_plan(records: &[DailyRecord], goals: &[Goal], today: NaiveDate) -> String {
    let avg = averages(records);

    let goals_section = if goals.is_empty() {
        "- No active goals yet — add one small goal you can finish today".to_string()
    } else {
        goals
            .iter()
            .map(|g| {
                format!(
                    "- {} ({} | priority: {} | progress: {}%)",
                    g.title,
                    g.category,
                    priority_label(g.priority),
                    g.progress
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let energy_advice = if avg.energy < 6.0 {
        "- Prioritize high-value, low-effort tasks today; avoid long stretches of deep focus\n- Schedule one or two short walks or stretches (5-10 minutes each)"
    } else {
        "- Schedule one deep-work block (25-45 minutes) with a short break after\n- Add a light outdoor activity in the afternoon to keep momentum"
    };

    let mood_advice = if avg.mood < 6.0 {
        "- Spend three minutes naming what is weighing on you, with one concrete trigger\n- Write one gratitude note or send a quick hello to a friend"
    } else {
        "- Note one small win worth celebrating\n- Leave a line of encouragement for your future self"
    };

    let productivity_advice = if avg.productivity < 6.0 {
        "- Run one pomodoro (25/5) on a small, well-defined task\n- Split your biggest goal into three steps you can advance today"
    } else {
        "- Keep doing what works: front-load the key task, minimize context switches"
    };

    format!(
        "# Plan for {today}\n\n\
         Overview (last {n} days): mood {mood:.1}/10 | energy {energy:.1}/10 | productivity {prod:.1}/10 | goals completed: {goals_done}\n\n\
         ## Priority tasks\n{goals_section}\n\n\
         ## Suggested schedule\n\
         - Morning: push the single most important item forward (30-60 minutes)\n\
         - Afternoon: review and adjust; batch messages and small tasks (30 minutes)\n\
         - Evening: 10-minute wrap-up — one highlight, one thing to improve\n\n\
         ## Mood & energy\n{energy_advice}\n{mood_advice}\n\n\
         ## Efficiency\n{productivity_advice}\n\n\
         ## Keep in mind\n\
         - Leave 20-30% of the day unplanned\n\
         - Note your most distracting moment; it helps spot interference patterns later\n\n\
         When you finish, check items off on the dashboard to bank points and keep the streak alive.",
        today = today,
        n = records.len(),
        mood = avg.mood,
        energy = avg.energy,
        prod = avg.productivity,
        goals_done = avg.goals_completed,
        goals_section = goals_section,
        energy_advice = energy_advice,
        mood_advice = mood_advice,
        productivity_advice = productivity_advice,
    )
}

/// Plan for a user with no history yet.
fn starter_plan() -> String {
    "Welcome! A good first day of journaling:\n\n\
     1. Record how you are feeling right now\n\
     2. Set one small goal for today\n\
     3. Note one thing you are grateful for\n\
     4. Write a sentence about what you hope today brings\n\n\
     Small daily records add up to real change."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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
    fn test_local_plan_is_deterministic_and_structured() {
        let records = vec![
            record("2024-03-08", 7, 5, 6, 1),
            record("2024-03-09", 8, 6, 7, 2),
        ];
        let goals = vec![];
        let today = "2024-03-10".parse().unwrap();

        let first = build_local_plan(&records, &goals, today);
        let second = build_local_plan(&records, &goals, today);

        assert_eq!(first, second);
        assert!(first.contains("# Plan for 2024-03-10"));
        assert!(first.contains("mood 7.5/10"));
        assert!(first.contains("## Priority tasks"));
        assert!(first.contains("## Suggested schedule"));
    }

    #[test]
    fn test_starter_plan_is_non_empty() {
        let plan = starter_plan();
        assert!(!plan.trim().is_empty());
        assert!(plan.contains("1."));
    }

    #[test]
    fn test_parse_analysis_accepts_fenced_json() {
        let text = "```json\n{\"insights\": [{\"type\": \"pattern\", \"title\": \"t\", \"content\": \"c\", \"confidence\": 0.7}], \"recommendations\": [\"r\"], \"patterns\": []}\n```";
        let analysis = parse_analysis(text).unwrap();
        assert_eq!(analysis.insights.len(), 1);
        assert_eq!(analysis.insights[0].insight_type, InsightType::Pattern);
        assert_eq!(analysis.recommendations, vec!["r".to_string()]);
    }

    #[test]
    fn test_parse_analysis_rejects_garbage() {
        assert!(parse_analysis("not json at all").is_err());
    }

    #[test]
    fn test_fallback_analysis_flags_low_mood() {
        let records = vec![
            record("2024-03-08", 3, 4, 5, 0),
            record("2024-03-09", 4, 5, 5, 1),
        ];
        let analysis = fallback_analysis(&records);

        assert!(!analysis.insights.is_empty());
        assert!(analysis
            .insights
            .iter()
            .any(|i| i.insight_type == InsightType::Warning));
        assert!(!analysis.recommendations.is_empty());
    }

    #[test]
    fn test_fallback_analysis_celebrates_productive_stretch() {
        let records = vec![
            record("2024-03-08", 8, 7, 8, 2),
            record("2024-03-09", 7, 8, 9, 1),
        ];
        let analysis = fallback_analysis(&records);

        assert!(analysis
            .insights
            .iter()
            .any(|i| i.insight_type == InsightType::Achievement));
    }
}
