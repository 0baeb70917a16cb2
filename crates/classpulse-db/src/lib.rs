//! # Classpulse DB
//!
//! PostgreSQL connection pool setup.
//!
//! ```ignore
//! let pool = classpulse_db::init_db_pool(&config.app.database_url, 10).await?;
//! let up = classpulse_db::ping(&pool).await;
//! ```

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;

/// Connects a pool to `database_url`.
///
/// The pool is cheaply cloneable and should live in the application state.
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "database pool initialized");
    Ok(pool)
}

/// Round-trips a trivial query; used by the health endpoint.
pub async fn ping(pool: &PgPool) -> bool {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "database ping failed");
            false
        }
    }
}
