//! # Classpulse API
//!
//! REST backend for student feedback: students rate and comment on their
//! teachers, teachers review and respond, and each teacher sees trends over the
//! feedback addressed to them.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/       # AuthUser extractor, role guards
//! ├── modules/          # Feature modules
//! │   ├── auth/        # Registration, login, password reset and change
//! │   ├── users/       # Profile, pictures, teacher directory, admin user management
//! │   ├── feedback/    # Feedback CRUD and the ownership policy
//! │   ├── analytics/   # Per-teacher aggregates
//! │   └── health/      # Health check and service banner
//! └── utils/           # Email delivery
//! ```
//!
//! Each feature module has a `controller.rs` (handlers + OpenAPI annotations), a
//! `service.rs` (queries and rules) and a `router.rs`. Shared types live in the
//! workspace crates:
//!
//! - `classpulse-core`: `AppError`, pagination, password hashing, file storage
//! - `classpulse-config`: configuration loaded from the environment
//! - `classpulse-db`: connection pool
//! - `classpulse-auth`: JWT and password-reset tokens
//! - `classpulse-models`: domain types and request/response bodies
//!
//! ## Roles
//!
//! | Role | Can |
//! |------|-----|
//! | Student | submit feedback, edit it for 7 days, delete it |
//! | Teacher | read feedback addressed to them, set status and respond, view analytics |
//! | Admin | read and delete any feedback, manage accounts (created via `classpulse-cli`) |
//!
//! ## API Documentation
//!
//! - Swagger UI: `http://localhost:8080/swagger-ui`
//! - Scalar: `http://localhost:8080/scalar`

pub mod docs;
pub mod logging;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

pub use classpulse_auth;
pub use classpulse_config;
pub use classpulse_core;
pub use classpulse_db;
pub use classpulse_models;
