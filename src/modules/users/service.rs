use anyhow::anyhow;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use classpulse_core::AppError;
use classpulse_core::file_storage::{FileStorage, StorageError, upload_extension};
use classpulse_models::users::{
    ProfileChanges, TeacherListItem, USER_COLUMNS, UserListQuery, UserRow, UserStats,
};
use classpulse_models::{Role, User, UserId};

/// Maps a unique-index violation on `users` to the matching 400 message.
pub fn map_user_conflict(err: sqlx::Error) -> AppError {
    let message = match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            match db_err.constraint() {
                Some("users_email_key") => "Email already registered",
                Some("users_username_key") => "Username already taken",
                Some("users_student_id_key") => "Student ID already registered",
                _ => "Duplicate field value entered",
            }
        }
        _ => return AppError::database(err),
    };
    AppError::validation(message)
}

/// An uploaded image as received from multipart.
#[derive(Debug)]
pub struct ProfilePictureUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, id: UserId) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(db))]
    pub async fn get_by_id(db: &PgPool, id: UserId) -> Result<User, AppError> {
        Self::find_by_id(db, id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(db)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Resolves a login identifier: anything containing `@` is an email,
    /// everything else a username. Both match case-insensitively.
    #[instrument(skip(db))]
    pub async fn find_by_login(db: &PgPool, identifier: &str) -> Result<Option<User>, AppError> {
        if identifier.contains('@') {
            return Self::find_by_email(db, identifier).await;
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE LOWER(username) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(identifier.trim())
        .fetch_optional(db)
        .await?;

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(db))]
    pub async fn update_profile(
        db: &PgPool,
        user_id: UserId,
        changes: ProfileChanges,
    ) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                academic_year = COALESCE($6, academic_year),
                department = COALESCE($7, department),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(changes.username)
        .bind(changes.email.map(|e| e.into_inner()))
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.academic_year)
        .bind(changes.department)
        .fetch_optional(db)
        .await
        .map_err(map_user_conflict)?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        User::try_from(row)
    }

    /// Stores the new picture, points the user at it and removes the previous file.
    #[instrument(skip(db, storage, user, upload), fields(user_id = %user.id, size = upload.bytes.len()))]
    pub async fn upload_profile_picture(
        db: &PgPool,
        storage: &dyn FileStorage,
        user: &User,
        upload: ProfilePictureUpload,
    ) -> Result<(User, String), AppError> {
        storage
            .validate_upload(&upload.content_type, upload.bytes.len())
            .map_err(storage_error)?;

        let extension = upload_extension(upload.file_name.as_deref(), &upload.content_type);
        let key = format!("profile-pictures/{}.{}", Uuid::new_v4(), extension);

        let key = storage
            .save(&key, &upload.bytes)
            .await
            .map_err(storage_error)?;
        let url = storage.get_url(&key).map_err(storage_error)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET profile_picture = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&url)
        .fetch_one(db)
        .await?;

        if let Some(old_key) = storage.key_from_url(&user.profile_picture) {
            if let Err(e) = storage.delete(&old_key).await {
                tracing::warn!(error = %e, key = %old_key, "failed to remove previous profile picture");
            }
        }

        Ok((User::try_from(row)?, url))
    }

    #[instrument(skip(db))]
    pub async fn list_teachers(db: &PgPool) -> Result<Vec<TeacherListItem>, AppError> {
        let teachers = sqlx::query_as::<_, TeacherListItem>(
            "SELECT id, username, email, first_name, last_name, department
             FROM users
             WHERE role = 'teacher' AND is_active = TRUE
             ORDER BY first_name ASC, last_name ASC",
        )
        .fetch_all(db)
        .await?;

        Ok(teachers)
    }

    #[instrument(skip(db))]
    pub async fn list_users(
        db: &PgPool,
        query: &UserListQuery,
    ) -> Result<(Vec<User>, i64), AppError> {
        let pagination = query.pagination();

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        if let Some(role) = query.role {
            count_query.push(" AND role = ").push_bind(role);
        }
        let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut list_query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM users WHERE 1 = 1", USER_COLUMNS));
        if let Some(role) = query.role {
            list_query.push(" AND role = ").push_bind(role);
        }
        list_query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let users = list_query
            .build_query_as::<UserRow>()
            .fetch_all(db)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, total))
    }

    #[instrument(skip(db))]
    pub async fn stats(db: &PgPool) -> Result<UserStats, AppError> {
        let stats = sqlx::query_as::<_, UserStats>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE role = 'student') AS students,
                COUNT(*) FILTER (WHERE role = 'teacher') AS teachers,
                COUNT(*) FILTER (WHERE role = 'admin') AS admins,
                COUNT(*) FILTER (WHERE is_active) AS active
             FROM users",
        )
        .fetch_one(db)
        .await?;

        Ok(stats)
    }

    #[instrument(skip(db))]
    pub async fn set_active(
        db: &PgPool,
        acting_admin: UserId,
        target: UserId,
        is_active: bool,
    ) -> Result<User, AppError> {
        if acting_admin == target && !is_active {
            return Err(AppError::validation("You cannot deactivate your own account"));
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(target)
        .bind(is_active)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        User::try_from(row)
    }

    /// Whether `id` names an active teacher.
    #[instrument(skip(db))]
    pub async fn is_active_teacher(db: &PgPool, id: UserId) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND role = $2 AND is_active)",
        )
        .bind(id)
        .bind(Role::Teacher)
        .fetch_one(db)
        .await?;

        Ok(exists)
    }
}

fn storage_error(err: StorageError) -> AppError {
    if err.is_client_error() {
        AppError::validation(err.to_string())
    } else {
        AppError::internal(anyhow!(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_unique_errors_are_server_errors() {
        let err = map_user_conflict(sqlx::Error::RowNotFound);
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_client_storage_errors_are_400() {
        let err = storage_error(StorageError::InvalidMimeType {
            received: "text/plain".to_string(),
        });
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);

        let err = storage_error(StorageError::IoError(std::io::Error::other("disk")));
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
