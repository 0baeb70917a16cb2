use std::path::PathBuf;
use std::sync::Arc;

use classpulse_config::{AppConfig, Config, CorsConfig, EmailConfig, JwtConfig, RateLimitConfig};
use classpulse_core::file_storage::{FileStorage, LocalFileStorage};
use sqlx::PgPool;

/// URL prefix under which uploaded files are served.
pub const UPLOADS_PREFIX: &str = "/uploads";

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub app_config: AppConfig,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub file_storage: Arc<dyn FileStorage>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let file_storage = Arc::new(LocalFileStorage::new(
            PathBuf::from(&config.app.upload_dir),
            UPLOADS_PREFIX.to_string(),
        ));

        Self {
            db,
            app_config: config.app,
            jwt_config: config.jwt,
            email_config: config.email,
            cors_config: config.cors,
            rate_limit_config: config.rate_limit,
            file_storage,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("environment", &self.app_config.environment)
            .finish_non_exhaustive()
    }
}
