//! Feedback records: one student's rating of one teacher.

use chrono::{DateTime, Duration, Utc};
use classpulse_core::pagination::{Pagination, PaginationParams, deserialize_optional_i64};
use classpulse_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::ids::{FeedbackId, UserId};
use crate::users::{Actor, Role, UserSummary};
use crate::value_types::validate_academic_year_label;

/// Students may edit their feedback for this long after creating it.
pub const EDIT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "feedback_subject")]
pub enum Subject {
    Mathematics,
    Physics,
    Chemistry,
    Biology,
    #[serde(rename = "Computer Science")]
    #[sqlx(rename = "Computer Science")]
    ComputerScience,
    English,
    History,
    Geography,
    Economics,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "feedback_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Reviewed,
    Archived,
}

/// SELECT list joining both participants; rows decode into [`FeedbackRecord`].
pub const FEEDBACK_SELECT: &str = r#"
    SELECT f.id, f.student_id, f.teacher_id, f.subject, f.content, f.rating, f.status,
           f.teacher_response, f.is_anonymous, f.semester, f.academic_year,
           f.created_at, f.updated_at,
           s.username AS student_username, s.first_name AS student_first_name,
           s.last_name AS student_last_name,
           t.username AS teacher_username, t.first_name AS teacher_first_name,
           t.last_name AS teacher_last_name
    FROM feedback f
    JOIN users s ON s.id = f.student_id
    JOIN users t ON t.id = f.teacher_id
"#;

#[derive(Debug, Clone, FromRow)]
pub struct FeedbackRecord {
    pub id: FeedbackId,
    pub student_id: UserId,
    pub teacher_id: UserId,
    pub subject: Subject,
    pub content: String,
    pub rating: i32,
    pub status: FeedbackStatus,
    pub teacher_response: Option<String>,
    pub is_anonymous: bool,
    pub semester: i32,
    pub academic_year: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub student_username: String,
    pub student_first_name: String,
    pub student_last_name: String,
    pub teacher_username: String,
    pub teacher_first_name: String,
    pub teacher_last_name: String,
}

impl FeedbackRecord {
    /// The access-relevant part of the record.
    pub fn ownership(&self) -> FeedbackOwnership {
        FeedbackOwnership {
            student_id: self.student_id,
            teacher_id: self.teacher_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackOwnership {
    pub student_id: UserId,
    pub teacher_id: UserId,
}

/// Whether `now` is still inside the author's edit window. The boundary is
/// inclusive: exactly seven days after creation is still editable.
pub fn within_edit_window(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - created_at <= Duration::days(EDIT_WINDOW_DAYS)
}

/// Whole days elapsed since creation.
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    /// Teacher the feedback is about
    pub teacher: UserId,
    pub subject: Subject,
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Feedback content must be between 10 and 1000 characters"
    ))]
    pub content: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(range(min = 1, max = 4, message = "Semester must be between 1 and 4"))]
    pub semester: i32,
    #[validate(custom(function = "validate_academic_year_label"))]
    pub academic_year: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Partial update. Which fields apply depends on who is editing; the rest are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedbackRequest {
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Feedback content must be between 10 and 1000 characters"
    ))]
    pub content: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    pub subject: Option<Subject>,
    #[validate(range(min = 1, max = 4, message = "Semester must be between 1 and 4"))]
    pub semester: Option<i32>,
    pub is_anonymous: Option<bool>,
    pub status: Option<FeedbackStatus>,
    #[validate(length(max = 500, message = "Response cannot be more than 500 characters"))]
    pub teacher_response: Option<String>,
}

/// Fields the authoring student may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    pub content: Option<String>,
    pub rating: Option<i32>,
    pub subject: Option<Subject>,
    pub semester: Option<i32>,
    pub is_anonymous: Option<bool>,
}

/// Fields the addressed teacher may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherPatch {
    pub status: Option<FeedbackStatus>,
    pub teacher_response: Option<String>,
}

impl UpdateFeedbackRequest {
    pub fn student_patch(&self) -> StudentPatch {
        StudentPatch {
            content: self.content.clone(),
            rating: self.rating,
            subject: self.subject,
            semester: self.semester,
            is_anonymous: self.is_anonymous,
        }
    }

    pub fn teacher_patch(&self) -> TeacherPatch {
        TeacherPatch {
            status: self.status,
            teacher_response: self.teacher_response.clone(),
        }
    }
}

/// Outward representation of a feedback record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView {
    pub id: FeedbackId,
    /// Omitted for anonymous feedback unless the viewer is the author or an admin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<UserSummary>,
    pub teacher: UserSummary,
    pub subject: Subject,
    pub content: String,
    pub rating: i32,
    pub status: FeedbackStatus,
    pub teacher_response: Option<String>,
    pub is_anonymous: bool,
    pub semester: i32,
    pub academic_year: String,
    /// Whole days since creation
    pub age: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedbackView {
    pub fn for_viewer(record: FeedbackRecord, viewer: &Actor, now: DateTime<Utc>) -> Self {
        let reveal_student = !record.is_anonymous
            || viewer.id == record.student_id
            || viewer.role == Role::Admin;

        let student = reveal_student.then(|| UserSummary {
            id: record.student_id,
            username: record.student_username,
            first_name: record.student_first_name,
            last_name: record.student_last_name,
        });

        Self {
            id: record.id,
            student,
            teacher: UserSummary {
                id: record.teacher_id,
                username: record.teacher_username,
                first_name: record.teacher_first_name,
                last_name: record.teacher_last_name,
            },
            subject: record.subject,
            content: record.content,
            rating: record.rating,
            status: record.status,
            teacher_response: record.teacher_response,
            is_anonymous: record.is_anonymous,
            semester: record.semester,
            academic_year: record.academic_year,
            age: age_in_days(record.created_at, now),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FeedbackListQuery {
    pub status: Option<FeedbackStatus>,
    pub subject: Option<Subject>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub semester: Option<i64>,
    pub academic_year: Option<String>,
    /// Admins only: restrict to one teacher
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub teacher: Option<Uuid>,
    /// Comma-separated response fields, e.g. `subject,rating`
    pub select: Option<String>,
    /// Comma-separated sort keys, `-` for descending, e.g. `-createdAt,rating`
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl FeedbackListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Keeps only the requested top-level keys of a serialized view; `id` is always kept.
/// An empty selection returns the value unchanged.
pub fn project_fields(value: serde_json::Value, fields: &[String]) -> serde_json::Value {
    if fields.is_empty() {
        return value;
    }

    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(key, _)| key == "id" || fields.iter().any(|f| f == key))
                .collect(),
        ),
        other => other,
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub success: bool,
    pub data: FeedbackView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackListResponse {
    pub success: bool,
    /// Items on this page
    pub count: usize,
    /// Items across all pages
    pub total: i64,
    pub pagination: Pagination,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<serde_json::Value>,
}
