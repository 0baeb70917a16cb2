//! # Classpulse Core
//!
//! Foundational types shared by every Classpulse crate:
//!
//! - [`errors`]: `AppError` and the error taxonomy rendered as JSON responses
//! - [`pagination`]: page/limit parameters and `next`/`prev` cursors
//! - [`password`]: bcrypt hashing and verification
//! - [`serde`]: query-string deserialization helpers
//! - [`file_storage`]: storage backend for uploaded profile pictures

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;
pub mod serde;

pub use errors::{AppError, ErrorKind, ErrorResponse};
pub use pagination::{PageCursor, Pagination, PaginationParams};
pub use password::{hash_password, verify_password};
