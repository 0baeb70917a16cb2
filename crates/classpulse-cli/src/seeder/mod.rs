//! Demo data seeding.
//!
//! All seeded accounts live under [`models::SEED_EMAIL_DOMAIN`] so they can be
//! removed again without touching real users.

pub mod feedback;
pub mod models;
pub mod users;

use sqlx::PgPool;
use std::time::Instant;

pub use models::{SEED_EMAIL_DOMAIN, SEED_PASSWORD, SeedConfig};

pub type SeedResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Rows per multi-row INSERT; keeps the bind count well under Postgres' limit.
pub(crate) const BATCH_SIZE: usize = 500;

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> SeedResult<()> {
    let start = Instant::now();
    println!(
        "🌱 Seeding {} teachers, {} students, {} feedback entries...",
        config.teachers, config.students, config.feedback
    );

    let teacher_ids = users::seed_teachers(db, config.teachers).await?;
    let student_ids = users::seed_students(db, config.students).await?;
    feedback::seed_feedback(db, &student_ids, &teacher_ids, config.feedback).await?;

    println!("✅ Seeding finished in {:.2?}", start.elapsed());
    Ok(())
}

/// Deletes every seeded account; their feedback goes with them.
pub async fn clear_seeded_data(db: &PgPool) -> SeedResult<u64> {
    let pattern = format!("%@{}", SEED_EMAIL_DOMAIN);
    let result = sqlx::query("DELETE FROM users WHERE email LIKE $1")
        .bind(pattern)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
