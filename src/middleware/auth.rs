use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use classpulse_auth::{Claims, verify_token};
use classpulse_core::AppError;
use classpulse_models::{Actor, Role, User, UserId};

use crate::modules::users::service::UserService;
use crate::state::AppState;

const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Extractor that validates the bearer token and loads the account it names.
///
/// The token only identifies the user; role and active status come from the
/// database on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role()
    }

    pub fn actor(&self) -> Actor {
        self.user.actor()
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized(NOT_AUTHORIZED.to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth_user) = parts.extensions.get::<AuthUser>() {
            return Ok(auth_user.clone());
        }

        let token = bearer_token(parts)?;
        let claims = verify_token(token, &state.jwt_config)?;

        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized(NOT_AUTHORIZED.to_string()))?;

        let user = UserService::find_by_id(&state.db, user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::unauthorized(NOT_AUTHORIZED.to_string()))?;

        let auth_user = AuthUser { claims, user };
        parts.extensions.insert(auth_user.clone());

        Ok(auth_user)
    }
}
