//! # Classpulse Models
//!
//! Domain models, database rows and request/response bodies.
//!
//! - [`ids`]: `UserId`, `FeedbackId`
//! - [`value_types`]: `Email`, academic year label validation
//! - [`users`]: roles, the role-tagged `User`, registration and profile DTOs
//! - [`feedback`]: feedback records, patches and the viewer-specific representation
//! - [`analytics`]: aggregate rows and the analytics report
//! - [`auth`]: login, password reset and envelope responses

pub mod analytics;
pub mod auth;
pub mod feedback;
pub mod ids;
pub mod users;
pub mod value_types;

pub use ids::{FeedbackId, UserId};
pub use users::{Actor, Department, Role, User, UserView};
