pub mod analytics;
pub mod auth;
pub mod feedback;
pub mod health;
pub mod users;
