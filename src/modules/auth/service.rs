use anyhow::anyhow;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use classpulse_auth::{create_access_token, generate_reset_token, hash_reset_token};
use classpulse_config::JwtConfig;
use classpulse_core::{AppError, hash_password, verify_password};
use classpulse_models::User;
use classpulse_models::auth::{AuthResponse, LoginRequest};
use classpulse_models::users::{NewUser, RegisterRequest, USER_COLUMNS, UserRow};
use classpulse_models::{UserId, UserView};

use crate::modules::users::service::{UserService, map_user_conflict};
use crate::utils::email::EmailService;

/// `{success, token, user}` for a freshly authenticated user.
pub fn token_response(user: &User, jwt_config: &JwtConfig) -> Result<AuthResponse, AppError> {
    let token = create_access_token(user.id.into_inner(), user.role().as_str(), jwt_config)?;
    Ok(AuthResponse {
        success: true,
        token,
        user: UserView::from(user),
    })
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, email_service, dto), fields(email = %dto.email, role = %dto.role))]
    pub async fn register(
        db: &PgPool,
        email_service: &EmailService,
        dto: RegisterRequest,
    ) -> Result<User, AppError> {
        let new_user = NewUser::from_registration(dto)?;
        let password_hash = hash_password(&new_user.password)?;
        let (student_id, academic_year, department) = new_user.profile.columns();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users
                (id, username, email, password, role, first_name, last_name,
                 student_id, academic_year, department)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(UserId::new())
        .bind(&new_user.username)
        .bind(new_user.email.as_str())
        .bind(&password_hash)
        .bind(new_user.profile.role())
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(student_id)
        .bind(academic_year)
        .bind(department)
        .fetch_one(db)
        .await
        .map_err(map_user_conflict)?;

        let user = User::try_from(row)?;

        if let Err(e) = email_service
            .send_welcome_email(&user.email, &user.full_name())
            .await
        {
            warn!(error = %e.error, user_id = %user.id, "welcome email failed");
        }

        Ok(user)
    }

    /// Not-found, inactive and wrong-password all fail the same way.
    #[instrument(skip(db, dto), fields(identifier = %dto.email))]
    pub async fn login(db: &PgPool, dto: LoginRequest) -> Result<User, AppError> {
        let user = UserService::find_by_login(db, &dto.email)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(AppError::invalid_credentials)?;

        if !verify_password(&dto.password, &user.password_hash)? {
            return Err(AppError::invalid_credentials());
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET last_login = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.id)
        .fetch_one(db)
        .await?;

        User::try_from(row)
    }

    /// Stores a hashed reset token and mails the raw one inside `{public_url}/api/auth/resetpassword/{token}`.
    #[instrument(skip(db, email_service, public_url))]
    pub async fn forgot_password(
        db: &PgPool,
        email_service: &EmailService,
        public_url: &str,
        email: &str,
    ) -> Result<(), AppError> {
        let user = UserService::find_by_email(db, email)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("There is no user with that email")))?;

        let token = generate_reset_token();

        sqlx::query(
            "UPDATE users SET reset_password_token = $2, reset_password_expire = $3 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&token.hashed)
        .bind(token.expires_at)
        .execute(db)
        .await?;

        let reset_url = format!("{}/api/auth/resetpassword/{}", public_url, token.raw);

        if let Err(e) = email_service
            .send_password_reset_email(&user.email, &user.full_name(), &reset_url)
            .await
        {
            warn!(error = %e.error, user_id = %user.id, "password reset email failed");

            sqlx::query(
                "UPDATE users SET reset_password_token = NULL, reset_password_expire = NULL \
                 WHERE id = $1",
            )
            .bind(user.id)
            .execute(db)
            .await?;

            return Err(AppError::internal_with_message("Email could not be sent"));
        }

        Ok(())
    }

    #[instrument(skip(db, raw_token, new_password))]
    pub async fn reset_password(
        db: &PgPool,
        raw_token: &str,
        new_password: &str,
    ) -> Result<User, AppError> {
        let hashed = hash_reset_token(raw_token);

        let user_id: Uuid = sqlx::query_scalar(
            "SELECT id FROM users WHERE reset_password_token = $1 AND reset_password_expire > $2",
        )
        .bind(&hashed)
        .bind(Utc::now())
        .fetch_optional(db)
        .await?
        .ok_or_else(AppError::invalid_or_expired_token)?;

        let password_hash = hash_password(new_password)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET password = $2, reset_password_token = NULL,
                reset_password_expire = NULL, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&password_hash)
        .fetch_one(db)
        .await?;

        User::try_from(row)
    }

    #[instrument(skip(db, user, current_password, new_password), fields(user_id = %user.id))]
    pub async fn update_password(
        db: &PgPool,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<User, AppError> {
        if !verify_password(current_password, &user.password_hash)? {
            return Err(AppError::unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(new_password)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&password_hash)
        .fetch_one(db)
        .await?;

        User::try_from(row)
    }
}
