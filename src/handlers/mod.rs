pub mod ai;
pub mod auth;
pub mod checkins;
pub mod focus;
pub mod gamification;
pub mod goals;
pub mod health;
pub mod records;
pub mod reports;
