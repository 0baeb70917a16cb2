use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::instrument;

use classpulse_core::{AppError, ErrorResponse, Pagination};
use classpulse_models::auth::MessageResponse;
use classpulse_models::feedback::{
    CreateFeedbackRequest, FeedbackListQuery, FeedbackListResponse, FeedbackResponse,
    FeedbackView, UpdateFeedbackRequest, project_fields,
};
use classpulse_models::FeedbackId;

use super::model::selected_fields;
use super::service::FeedbackService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireStudent;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

fn parse_feedback_id(id: &str) -> Result<FeedbackId, AppError> {
    id.parse()
        .map_err(|_| AppError::not_found(anyhow!("Feedback not found")))
}

/// List feedback visible to the caller
#[utoipa::path(
    get,
    path = "/api/feedback",
    params(FeedbackListQuery),
    responses(
        (status = 200, description = "Paginated feedback", body = FeedbackListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn list_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<FeedbackListQuery>,
) -> Result<Json<FeedbackListResponse>, AppError> {
    let actor = auth_user.actor();
    let (records, total) = FeedbackService::list(&state.db, &actor, &query).await?;

    let now = Utc::now();
    let fields = selected_fields(query.select.as_deref());
    let data = records
        .into_iter()
        .map(|record| {
            serde_json::to_value(FeedbackView::for_viewer(record, &actor, now))
                .map(|value| project_fields(value, &fields))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(FeedbackListResponse {
        success: true,
        count: data.len(),
        total,
        pagination: Pagination::from_total(&query.pagination(), total),
        data,
    }))
}

/// Submit feedback about a teacher (students only)
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Feedback created", body = FeedbackResponse),
        (status = 400, description = "Validation error or invalid teacher", body = ErrorResponse),
        (status = 403, description = "Not a student", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, student, dto), fields(user_id = %student.id()))]
pub async fn create_feedback(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    ValidatedJson(dto): ValidatedJson<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), AppError> {
    let actor = student.actor();
    let record = FeedbackService::create(&state.db, &actor, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            success: true,
            data: FeedbackView::for_viewer(record, &actor, Utc::now()),
        }),
    ))
}

/// Get one feedback record
#[utoipa::path(
    get,
    path = "/api/feedback/{id}",
    params(("id" = String, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Feedback", body = FeedbackResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn get_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let actor = auth_user.actor();
    let record = FeedbackService::get(&state.db, &actor, parse_feedback_id(&id)?).await?;

    Ok(Json(FeedbackResponse {
        success: true,
        data: FeedbackView::for_viewer(record, &actor, Utc::now()),
    }))
}

/// Update feedback. Authors edit content within 7 days; teachers set status and response
#[utoipa::path(
    put,
    path = "/api/feedback/{id}",
    params(("id" = String, Path, description = "Feedback ID")),
    request_body = UpdateFeedbackRequest,
    responses(
        (status = 200, description = "Feedback updated", body = FeedbackResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not allowed, or edit window expired", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id()))]
pub async fn update_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateFeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let actor = auth_user.actor();
    let record =
        FeedbackService::update(&state.db, &actor, parse_feedback_id(&id)?, dto).await?;

    Ok(Json(FeedbackResponse {
        success: true,
        data: FeedbackView::for_viewer(record, &actor, Utc::now()),
    }))
}

/// Delete feedback
#[utoipa::path(
    delete,
    path = "/api/feedback/{id}",
    params(("id" = String, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Feedback deleted", body = MessageResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Feedback not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn delete_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    FeedbackService::delete(&state.db, &auth_user.actor(), parse_feedback_id(&id)?).await?;
    Ok(Json(MessageResponse::new("Feedback deleted successfully")))
}
