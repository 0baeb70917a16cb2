use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use classpulse_core::{AppError, ErrorResponse};
use classpulse_models::analytics::{AnalyticsQuery, AnalyticsResponse, TimeRange};

use super::service::AnalyticsService;
use crate::middleware::role::RequireTeacher;
use crate::state::AppState;
use crate::validator::ValidatedQuery;

/// Feedback analytics for the signed-in teacher
#[utoipa::path(
    get,
    path = "/api/analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Trends, rating distribution and lifetime totals", body = AnalyticsResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a teacher", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
#[instrument(skip(state, teacher), fields(user_id = %teacher.id()))]
pub async fn get_analytics(
    State(state): State<AppState>,
    RequireTeacher(teacher): RequireTeacher,
    ValidatedQuery(query): ValidatedQuery<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let time_range = TimeRange::parse_or_default(query.time_range.as_deref());
    let data =
        AnalyticsService::teacher_report(&state.db, teacher.id(), time_range, Utc::now()).await?;

    Ok(Json(AnalyticsResponse {
        success: true,
        data,
    }))
}
