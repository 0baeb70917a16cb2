use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use classpulse_core::{ErrorKind, ErrorResponse, PageCursor, Pagination};
use classpulse_models::analytics::{
    AnalyticsData, AnalyticsResponse, DailyAverage, DailyCount, TimeRange, TotalStats,
};
use classpulse_models::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, ProfilePictureResponse,
    ResetPasswordRequest, TeacherListResponse, UserListResponse, UserResponse, UserStatsResponse,
};
use classpulse_models::feedback::{
    CreateFeedbackRequest, FeedbackListResponse, FeedbackResponse, FeedbackStatus, FeedbackView,
    Subject, UpdateFeedbackRequest,
};
use classpulse_models::users::{
    Department, RegisterRequest, Role, SetActiveRequest, TeacherListItem, UpdatePasswordRequest,
    UpdateProfileRequest, UserStats, UserSummary, UserView,
};

use crate::modules::health::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::update_password,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::upload_profile_picture,
        crate::modules::users::controller::list_teachers,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::user_stats,
        crate::modules::users::controller::set_user_status,
        crate::modules::feedback::controller::list_feedback,
        crate::modules::feedback::controller::create_feedback,
        crate::modules::feedback::controller::get_feedback,
        crate::modules::feedback::controller::update_feedback,
        crate::modules::feedback::controller::delete_feedback,
        crate::modules::analytics::controller::get_analytics,
        crate::modules::health::health,
    ),
    components(
        schemas(
            ErrorKind,
            ErrorResponse,
            Pagination,
            PageCursor,
            Role,
            Department,
            UserView,
            UserSummary,
            UserStats,
            TeacherListItem,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UserResponse,
            UpdateProfileRequest,
            UpdatePasswordRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            MessageResponse,
            ProfilePictureResponse,
            TeacherListResponse,
            UserListResponse,
            UserStatsResponse,
            SetActiveRequest,
            Subject,
            FeedbackStatus,
            FeedbackView,
            CreateFeedbackRequest,
            UpdateFeedbackRequest,
            FeedbackResponse,
            FeedbackListResponse,
            TimeRange,
            TotalStats,
            DailyCount,
            DailyAverage,
            AnalyticsData,
            AnalyticsResponse,
            HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and password management"),
        (name = "Profile", description = "Profile updates, pictures and the teacher directory"),
        (name = "Feedback", description = "Student feedback about teachers"),
        (name = "Analytics", description = "Per-teacher feedback aggregates"),
        (name = "Users", description = "Admin account management"),
        (name = "Health", description = "Service health")
    ),
    info(
        title = "Classpulse API",
        version = "0.1.0",
        description = "Student feedback management: students rate teachers, teachers respond, everyone sees trends.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/resetpassword/{resettoken}",
            "/api/feedback",
            "/api/feedback/{id}",
            "/api/analytics",
            "/api/users/{id}/status",
            "/api/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
