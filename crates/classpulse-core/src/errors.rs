//! Application error type with HTTP response conversion.
//!
//! Every handler and service returns `Result<T, AppError>`. The error carries an
//! HTTP status, a machine-readable [`ErrorKind`] and the underlying `anyhow`
//! error whose message becomes the response `message`.
//!
//! Response body:
//!
//! ```json
//! { "success": false, "message": "Invalid credentials", "error": "InvalidCredentials" }
//! ```
//!
//! Server errors hide their cause behind a generic message; debug builds attach the
//! error chain under `stack`.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

/// Error taxonomy exposed to clients in the `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ErrorKind {
    ValidationError,
    InvalidReference,
    InvalidOrExpiredToken,
    Unauthorized,
    InvalidCredentials,
    Forbidden,
    EditWindowExpired,
    NotFound,
    TooManyRequests,
    ServerError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::InvalidReference => "InvalidReference",
            Self::InvalidOrExpiredToken => "InvalidOrExpiredToken",
            Self::Unauthorized => "Unauthorized",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::Forbidden => "Forbidden",
            Self::EditWindowExpired => "EditWindowExpired",
            Self::NotFound => "NotFound",
            Self::TooManyRequests => "TooManyRequests",
            Self::ServerError => "ServerError",
        }
    }

    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::ValidationError,
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::TooManyRequests,
            _ => Self::ServerError,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub error: Error,
    /// Server errors normally hide their message; set for messages meant for clients.
    pub public_message: bool,
}

/// Error body as documented in the OpenAPI schema.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: ErrorKind,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            kind: ErrorKind::from_status(status),
            error: err.into(),
            public_message: false,
        }
    }

    pub fn with_kind<E>(status: StatusCode, kind: ErrorKind, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            kind,
            error: err.into(),
            public_message: false,
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            anyhow::anyhow!("Too many requests, please try again later."),
        )
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::bad_request(anyhow::anyhow!(message.into()))
    }

    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::with_kind(
            StatusCode::BAD_REQUEST,
            ErrorKind::InvalidReference,
            anyhow::anyhow!(message.into()),
        )
    }

    pub fn invalid_or_expired_token() -> Self {
        Self::with_kind(
            StatusCode::BAD_REQUEST,
            ErrorKind::InvalidOrExpiredToken,
            anyhow::anyhow!("Invalid or expired token"),
        )
    }

    pub fn unauthorized(message: String) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message))
    }

    pub fn invalid_credentials() -> Self {
        Self::with_kind(
            StatusCode::UNAUTHORIZED,
            ErrorKind::InvalidCredentials,
            anyhow::anyhow!("Invalid credentials"),
        )
    }

    pub fn forbidden(message: String) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message))
    }

    pub fn edit_window_expired() -> Self {
        Self::with_kind(
            StatusCode::FORBIDDEN,
            ErrorKind::EditWindowExpired,
            anyhow::anyhow!("Feedback can only be edited within 7 days of creation"),
        )
    }

    pub fn internal_error(message: String) -> Self {
        Self::internal(anyhow::anyhow!(message))
    }

    /// A 500 whose message is shown to the client as-is.
    pub fn internal_with_message(message: impl Into<String>) -> Self {
        Self {
            public_message: true,
            ..Self::internal(anyhow::anyhow!(message.into()))
        }
    }

    /// Maps a unique-constraint violation to a 400 with `message`; anything else is a
    /// database failure.
    pub fn from_unique_violation(err: sqlx::Error, message: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::validation(message);
            }
        }
        Self::database(err)
    }

    pub fn message(&self) -> String {
        if self.status.is_server_error() && !self.public_message {
            "Server Error".to_string()
        } else {
            self.error.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = if self.status.is_server_error() {
            tracing::error!(error = ?self.error, "request failed");
            if cfg!(debug_assertions) {
                json!({
                    "success": false,
                    "message": self.message(),
                    "error": self.kind.as_str(),
                    "stack": format!("{:?}", self.error),
                })
            } else {
                json!({
                    "success": false,
                    "message": self.message(),
                    "error": self.kind.as_str(),
                })
            }
        } else {
            json!({
                "success": false,
                "message": self.message(),
                "error": self.kind.as_str(),
            })
        };

        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_status() {
        assert_eq!(
            AppError::bad_request(anyhow::anyhow!("x")).kind,
            ErrorKind::ValidationError
        );
        assert_eq!(
            AppError::unauthorized("x".into()).kind,
            ErrorKind::Unauthorized
        );
        assert_eq!(AppError::forbidden("x".into()).kind, ErrorKind::Forbidden);
        assert_eq!(
            AppError::not_found(anyhow::anyhow!("x")).kind,
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::internal(anyhow::anyhow!("x")).kind,
            ErrorKind::ServerError
        );
    }

    #[test]
    fn test_specific_kinds_keep_their_status() {
        let err = AppError::edit_window_expired();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.kind, ErrorKind::EditWindowExpired);

        let err = AppError::invalid_credentials();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Invalid credentials");

        let err = AppError::invalid_or_expired_token();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, ErrorKind::InvalidOrExpiredToken);

        let err = AppError::invalid_reference("Invalid teacher selected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, ErrorKind::InvalidReference);

        let err = AppError::too_many_requests();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.kind, ErrorKind::TooManyRequests);
        assert_eq!(err.message(), "Too many requests, please try again later.");
    }

    #[test]
    fn test_server_error_message_is_generic() {
        let err = AppError::internal(anyhow::anyhow!("connection refused"));
        assert_eq!(err.message(), "Server Error");
    }

    #[test]
    fn test_public_server_message() {
        let err = AppError::internal_with_message("Email could not be sent");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.message(), "Email could not be sent");
    }

    #[test]
    fn test_question_mark_conversion_is_server_error() {
        fn fails() -> Result<(), AppError> {
            Err(std::io::Error::other("disk"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_non_unique_database_error_is_server_error() {
        let err = AppError::from_unique_violation(sqlx::Error::RowNotFound, "dup");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
