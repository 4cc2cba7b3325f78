pub mod checkin;
pub mod daily_record;
pub mod focus_session;
pub mod goal;
pub mod insight;
pub mod points;
pub mod profile;
pub mod user;
