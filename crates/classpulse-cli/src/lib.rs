//! # Classpulse CLI
//!
//! Seeding utilities used by the `classpulse-cli` binary.
//!
//! ```ignore
//! use classpulse_cli::seeder::{seed_all, SeedConfig};
//!
//! seed_all(&pool, SeedConfig { teachers: 5, students: 40, feedback: 200 }).await?;
//! ```

pub mod seeder;
