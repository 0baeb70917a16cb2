use anyhow::anyhow;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use classpulse_core::AppError;
use classpulse_models::feedback::{
    CreateFeedbackRequest, FEEDBACK_SELECT, FeedbackListQuery, FeedbackRecord, FeedbackStatus,
    UpdateFeedbackRequest, within_edit_window,
};
use classpulse_models::{Actor, FeedbackId, Role, UserId};

use super::model::order_by_clause;
use super::policy::{FeedbackAction, authorize};
use crate::modules::users::service::UserService;

/// Restricts a query over `feedback f` to what `actor` may list, plus the
/// caller's filters.
fn push_scope_and_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    actor: &Actor,
    query: &'a FeedbackListQuery,
) {
    match actor.role {
        Role::Student => {
            builder.push(" AND f.student_id = ").push_bind(actor.id);
        }
        Role::Teacher => {
            builder.push(" AND f.teacher_id = ").push_bind(actor.id);
        }
        Role::Admin => {
            if let Some(teacher) = query.teacher {
                builder
                    .push(" AND f.teacher_id = ")
                    .push_bind(UserId::from_uuid(teacher));
            }
        }
    }

    if let Some(status) = query.status {
        builder.push(" AND f.status = ").push_bind(status);
    }
    if let Some(subject) = query.subject {
        builder.push(" AND f.subject = ").push_bind(subject);
    }
    if let Some(semester) = query.semester {
        builder.push(" AND f.semester = ").push_bind(semester);
    }
    if let Some(academic_year) = query.academic_year.as_deref() {
        builder.push(" AND f.academic_year = ").push_bind(academic_year);
    }
}

pub struct FeedbackService;

impl FeedbackService {
    #[instrument(skip(db))]
    pub async fn find_record(db: &PgPool, id: FeedbackId) -> Result<FeedbackRecord, AppError> {
        sqlx::query_as::<_, FeedbackRecord>(&format!("{} WHERE f.id = $1", FEEDBACK_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Feedback not found")))
    }

    #[instrument(skip(db, dto), fields(teacher = %dto.teacher))]
    pub async fn create(
        db: &PgPool,
        student: &Actor,
        dto: CreateFeedbackRequest,
    ) -> Result<FeedbackRecord, AppError> {
        if student.role != Role::Student {
            return Err(AppError::forbidden(
                "Only students can submit feedback".to_string(),
            ));
        }
        if dto.teacher == student.id {
            return Err(AppError::validation(
                "You cannot submit feedback about yourself",
            ));
        }
        if !UserService::is_active_teacher(db, dto.teacher).await? {
            return Err(AppError::invalid_reference("Invalid teacher selected"));
        }

        let id = FeedbackId::new();
        sqlx::query(
            "INSERT INTO feedback
                (id, student_id, teacher_id, subject, content, rating, status,
                 is_anonymous, semester, academic_year)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(id)
        .bind(student.id)
        .bind(dto.teacher)
        .bind(dto.subject)
        .bind(&dto.content)
        .bind(dto.rating)
        .bind(FeedbackStatus::Pending)
        .bind(dto.is_anonymous)
        .bind(dto.semester)
        .bind(&dto.academic_year)
        .execute(db)
        .await?;

        Self::find_record(db, id).await
    }

    /// One page of the feedback visible to `actor`, with the total across pages.
    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        actor: &Actor,
        query: &FeedbackListQuery,
    ) -> Result<(Vec<FeedbackRecord>, i64), AppError> {
        let pagination = query.pagination();

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM feedback f WHERE 1 = 1");
        push_scope_and_filters(&mut count_query, actor, query);
        let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut list_query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{} WHERE 1 = 1", FEEDBACK_SELECT));
        push_scope_and_filters(&mut list_query, actor, query);
        list_query
            .push(" ORDER BY ")
            .push(order_by_clause(query.sort.as_deref()))
            .push(" LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let records = list_query
            .build_query_as::<FeedbackRecord>()
            .fetch_all(db)
            .await?;

        Ok((records, total))
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, actor: &Actor, id: FeedbackId) -> Result<FeedbackRecord, AppError> {
        let record = Self::find_record(db, id).await?;
        authorize(actor, &record.ownership(), FeedbackAction::Read)?;
        Ok(record)
    }

    /// Applies the part of `dto` the actor is allowed to change: the author's
    /// content fields inside the edit window, or the teacher's status and response.
    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        actor: &Actor,
        id: FeedbackId,
        dto: UpdateFeedbackRequest,
    ) -> Result<FeedbackRecord, AppError> {
        let record = Self::find_record(db, id).await?;
        authorize(actor, &record.ownership(), FeedbackAction::Update)?;

        if actor.id == record.student_id {
            if !within_edit_window(record.created_at, Utc::now()) {
                return Err(AppError::edit_window_expired());
            }

            let patch = dto.student_patch();
            sqlx::query(
                "UPDATE feedback SET
                    content = COALESCE($2, content),
                    rating = COALESCE($3, rating),
                    subject = COALESCE($4, subject),
                    semester = COALESCE($5, semester),
                    is_anonymous = COALESCE($6, is_anonymous),
                    updated_at = NOW()
                 WHERE id = $1",
            )
            .bind(id)
            .bind(patch.content)
            .bind(patch.rating)
            .bind(patch.subject)
            .bind(patch.semester)
            .bind(patch.is_anonymous)
            .execute(db)
            .await?;
        } else {
            let patch = dto.teacher_patch();
            sqlx::query(
                "UPDATE feedback SET
                    status = COALESCE($2, status),
                    teacher_response = COALESCE($3, teacher_response),
                    updated_at = NOW()
                 WHERE id = $1",
            )
            .bind(id)
            .bind(patch.status)
            .bind(patch.teacher_response)
            .execute(db)
            .await?;
        }

        Self::find_record(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, actor: &Actor, id: FeedbackId) -> Result<(), AppError> {
        let record = Self::find_record(db, id).await?;
        authorize(actor, &record.ownership(), FeedbackAction::Delete)?;

        sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(())
    }
}
