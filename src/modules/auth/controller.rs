use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use classpulse_core::{AppError, ErrorResponse};
use classpulse_models::UserView;
use classpulse_models::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, ResetPasswordRequest,
    UserResponse,
};
use classpulse_models::users::{RegisterRequest, UpdatePasswordRequest};

use super::service::{AuthService, token_response};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::ValidatedJson;

/// Register a student or teacher account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error or duplicate email/username/student ID", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    let user = AuthService::register(&state.db, &email_service, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(token_response(&user, &state.jwt_config)?),
    ))
}

/// Log in with email or username
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = AuthService::login(&state.db, dto).await?;
    Ok(Json(token_response(&user, &state.jwt_config)?))
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The signed-in user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(auth_user), fields(user_id = %auth_user.id()))]
pub async fn me(auth_user: AuthUser) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(UserResponse {
        success: true,
        data: UserView::from(&auth_user.user),
    }))
}

/// Change password
#[utoipa::path(
    put,
    path = "/api/auth/updatepassword",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed, new token issued", body = AuthResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Current password is incorrect", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id()))]
pub async fn update_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdatePasswordRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = AuthService::update_password(
        &state.db,
        &auth_user.user,
        &dto.current_password,
        &dto.new_password,
    )
    .await?;
    Ok(Json(token_response(&user, &state.jwt_config)?))
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/api/auth/forgotpassword",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Email sent", body = MessageResponse),
        (status = 404, description = "No user with that email", body = ErrorResponse),
        (status = 500, description = "Email could not be sent", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email_service = EmailService::new(state.email_config.clone());
    AuthService::forgot_password(
        &state.db,
        &email_service,
        &state.app_config.public_url,
        &dto.email,
    )
    .await?;
    Ok(Json(MessageResponse::new("Email sent")))
}

/// Set a new password using the emailed token
#[utoipa::path(
    put,
    path = "/api/auth/resetpassword/{resettoken}",
    params(("resettoken" = String, Path, description = "Raw reset token from the email")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset, new token issued", body = AuthResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, reset_token, dto))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = AuthService::reset_password(&state.db, &reset_token, &dto.password).await?;
    Ok(Json(token_response(&user, &state.jwt_config)?))
}
