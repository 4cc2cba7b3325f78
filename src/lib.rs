use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use auth::rate_limit::RateLimitState;
use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

pub fn api_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Daily records
        .route("/api/records", post(handlers::records::upsert_record))
        .route("/api/records", get(handlers::records::list_records))
        .route("/api/records/:date", get(handlers::records::get_record_by_date))
        // Check-ins
        .route("/api/checkins", post(handlers::checkins::check_in))
        .route("/api/checkins", get(handlers::checkins::list_checkins))
        .route("/api/checkins/today", get(handlers::checkins::today_status))
        // Focus sessions
        .route("/api/focus-sessions", post(handlers::focus::log_focus_session))
        .route("/api/focus-sessions/today", get(handlers::focus::today_minutes))
        .route(
            "/api/focus-sessions/daily-minutes",
            get(handlers::focus::daily_minutes),
        )
        // Goals
        .route("/api/goals", get(handlers::goals::list_goals))
        .route("/api/goals", post(handlers::goals::create_goal))
        .route("/api/goals/:id", put(handlers::goals::update_goal))
        .route("/api/goals/:id", delete(handlers::goals::delete_goal))
        // Gamification
        .route(
            "/api/gamification/summary",
            get(handlers::gamification::get_summary),
        )
        .route(
            "/api/gamification/refresh",
            post(handlers::gamification::refresh_stats),
        )
        .route(
            "/api/gamification/achievements",
            get(handlers::gamification::list_achievements),
        )
        .route("/api/points/history", get(handlers::gamification::points_history))
        // AI & reports
        .route("/api/ai/analyze", post(handlers::ai::analyze))
        .route("/api/ai/plan", post(handlers::ai::plan))
        .route("/api/reports/weekly", post(handlers::reports::weekly_report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![state
            .config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .expect("FRONTEND_URL must be a valid origin")];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for origin in extra.split(',') {
                if let Ok(hv) = origin.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
