//! Request and response bodies for authentication and profile endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::users::{TeacherListItem, UserStats, UserView};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email address or username
    #[validate(length(min = 1, message = "Please provide an email and password"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please provide an email and password"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub data: UserView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfilePictureResponse {
    pub success: bool,
    pub data: UserView,
    /// Public path of the stored picture
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<TeacherListItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub success: bool,
    pub count: usize,
    pub total: i64,
    pub pagination: classpulse_core::Pagination,
    pub data: Vec<UserView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatsResponse {
    pub success: bool,
    pub data: UserStats,
}
