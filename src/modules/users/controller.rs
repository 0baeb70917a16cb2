use anyhow::anyhow;
use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use tracing::instrument;

use classpulse_core::{AppError, ErrorResponse, Pagination};
use classpulse_models::auth::{
    ProfilePictureResponse, TeacherListResponse, UserListResponse, UserResponse, UserStatsResponse,
};
use classpulse_models::users::{
    ProfileChanges, SetActiveRequest, UpdateProfileRequest, UserListQuery,
};
use classpulse_models::{UserId, UserView};

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::users::service::{ProfilePictureUpload, UserService};
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

/// Multipart field carrying the picture.
pub const PROFILE_PICTURE_FIELD: &str = "profilePicture";

/// Update the signed-in user's profile
#[utoipa::path(
    put,
    path = "/api/auth/update-profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error or duplicate email/username", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let changes = ProfileChanges::for_role(auth_user.role(), dto)?;
    let user = UserService::update_profile(&state.db, auth_user.id(), changes).await?;

    Ok(Json(UserResponse {
        success: true,
        data: UserView::from(&user),
    }))
}

/// Upload a profile picture (multipart field `profilePicture`, image up to 5 MB)
#[utoipa::path(
    post,
    path = "/api/auth/upload-profile-picture",
    request_body(content_type = "multipart/form-data", description = "Field `profilePicture`"),
    responses(
        (status = 200, description = "Picture stored", body = ProfilePictureResponse),
        (status = 400, description = "Missing file, not an image, or too large", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.id()))]
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ProfilePictureResponse>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        if field.name() != Some(PROFILE_PICTURE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        upload = Some(ProfilePictureUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| AppError::validation("Please upload a file"))?;

    let (user, url) = UserService::upload_profile_picture(
        &state.db,
        state.file_storage.as_ref(),
        &auth_user.user,
        upload,
    )
    .await?;

    Ok(Json(ProfilePictureResponse {
        success: true,
        data: UserView::from(&user),
        url,
    }))
}

/// List active teachers, sorted by first name
#[utoipa::path(
    get,
    path = "/api/auth/teachers",
    responses(
        (status = 200, description = "Active teachers", body = TeacherListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_teachers(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<TeacherListResponse>, AppError> {
    let teachers = UserService::list_teachers(&state.db).await?;

    Ok(Json(TeacherListResponse {
        success: true,
        count: teachers.len(),
        data: teachers,
    }))
}

/// List all users (admin)
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Paginated users", body = UserListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    let (users, total) = UserService::list_users(&state.db, &query).await?;
    let data: Vec<UserView> = users.iter().map(UserView::from).collect();

    Ok(Json(UserListResponse {
        success: true,
        count: data.len(),
        total,
        pagination: Pagination::from_total(&query.pagination(), total),
        data,
    }))
}

/// Account counts per role (admin)
#[utoipa::path(
    get,
    path = "/api/users/stats",
    responses(
        (status = 200, description = "Counts per role", body = UserStatsResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, _admin))]
pub async fn user_stats(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<UserStatsResponse>, AppError> {
    let stats = UserService::stats(&state.db).await?;
    Ok(Json(UserStatsResponse {
        success: true,
        data: stats,
    }))
}

/// Activate or deactivate an account (admin)
#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    params(("id" = String, Path, description = "User ID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Status updated", body = UserResponse),
        (status = 400, description = "Admins cannot deactivate themselves", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, admin))]
pub async fn set_user_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<SetActiveRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let target: UserId = id
        .parse()
        .map_err(|_| AppError::not_found(anyhow!("User not found")))?;

    let user = UserService::set_active(&state.db, admin.id(), target, dto.is_active).await?;

    Ok(Json(UserResponse {
        success: true,
        data: UserView::from(&user),
    }))
}
