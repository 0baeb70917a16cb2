//! # Classpulse Config
//!
//! Immutable configuration loaded once from the environment at startup and
//! handed to the server through its state:
//!
//! - [`app`]: bind address, environment, upload and log directories, database URL
//! - [`jwt`]: token secret and lifetime
//! - [`cors`]: allowed origins
//! - [`email`]: SMTP settings
//! - [`rate_limit`]: per-IP request budget
//!
//! ```ignore
//! dotenvy::dotenv().ok();
//! let config = Config::from_env();
//! ```

pub mod app;
pub mod cors;
pub mod email;
pub mod jwt;
pub mod rate_limit;

pub use app::{AppConfig, Environment};
pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub email: EmailConfig,
    pub rate_limit: RateLimitConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            app: AppConfig::from_env(),
            jwt: JwtConfig::from_env(),
            cors: CorsConfig::from_env(),
            email: EmailConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}
