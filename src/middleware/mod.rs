//! Request extractors and middleware for authentication and role checks.
//!
//! - [`auth`]: `AuthUser`, which validates the bearer token and loads the account
//! - [`role`]: role-gated middleware and extractors
//!
//! ```ignore
//! async fn me(auth_user: AuthUser) -> impl IntoResponse { /* any signed-in user */ }
//! async fn create(RequireStudent(student): RequireStudent) -> impl IntoResponse { /* students */ }
//! ```

pub mod auth;
pub mod role;
