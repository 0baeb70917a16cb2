//! Role-based authorization.
//!
//! Two ways to guard a route:
//! 1. Layer middleware via [`require_roles`] / [`require_admin`]
//! 2. Extractors such as [`RequireStudent`] that hand the handler the [`AuthUser`]

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use classpulse_core::AppError;
use classpulse_models::Role;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

fn role_denied(role: Role) -> AppError {
    AppError::forbidden(format!(
        "User role {} is not authorized to access this route",
        role
    ))
}

/// Returns an error unless `auth_user` has exactly `role`.
pub fn check_role(auth_user: &AuthUser, role: Role) -> Result<(), AppError> {
    check_any_role(auth_user, &[role])
}

pub fn check_any_role(auth_user: &AuthUser, roles: &[Role]) -> Result<(), AppError> {
    let role = auth_user.role();
    if roles.contains(&role) {
        Ok(())
    } else {
        Err(role_denied(role))
    }
}

/// Middleware that lets the request through only for `allowed_roles`.
///
/// ```rust,ignore
/// Router::new()
///     .route("/stats", get(stats))
///     .route_layer(middleware::from_fn_with_state(state.clone(), |state, req, next| {
///         require_roles(state, req, next, vec![Role::Admin])
///     }));
/// ```
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: Vec<Role>,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    check_any_role(&auth_user, &allowed_roles)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, vec![Role::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $role:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = AuthUser::from_request_parts(parts, state).await?;
                check_role(&auth_user, $role)?;
                Ok($name(auth_user))
            }
        }
    };
}

role_extractor!(
    /// Only students may proceed.
    RequireStudent,
    Role::Student
);
role_extractor!(
    /// Only teachers may proceed.
    RequireTeacher,
    Role::Teacher
);
role_extractor!(RequireAdmin, Role::Admin);
