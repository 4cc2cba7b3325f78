pub mod achievements;
pub mod gamification;
pub mod points_history;
pub mod scoring;
pub mod streak;
