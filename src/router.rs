use std::any::Any;
use std::sync::Arc;

use anyhow::anyhow;
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::{Router, middleware, routing::get};
use tower_governor::{GovernorError, GovernorLayer};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use classpulse_config::CorsConfig;
use classpulse_core::AppError;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::middleware::role::require_admin;
use crate::modules::analytics::router::init_analytics_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::feedback::router::init_feedback_router;
use crate::modules::health::{init_health_router, service_info};
use crate::modules::users::router::init_users_router;
use crate::state::{AppState, UPLOADS_PREFIX};

async fn route_not_found() -> AppError {
    AppError::not_found(anyhow!("Route not found"))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    AppError::internal(anyhow!("handler panicked: {}", detail)).into_response()
}

/// Renders limiter rejections in the shared error shape, keeping the
/// `retry-after` and `x-ratelimit-*` headers governor attaches.
fn rate_limit_response(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { headers, .. } => {
            let mut response = AppError::too_many_requests().into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        GovernorError::UnableToExtractKey => {
            AppError::internal(anyhow!("unable to determine client address")).into_response()
        }
        GovernorError::Other { code, msg, .. } => AppError::new(
            code,
            anyhow!(msg.unwrap_or_else(|| "Rate limiter error".to_string())),
        )
        .into_response(),
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    let mut api = Router::new()
        .nest("/auth", init_auth_router())
        .nest("/feedback", init_feedback_router())
        .nest("/analytics", init_analytics_router())
        .nest(
            "/users",
            init_users_router()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        )
        .nest("/health", init_health_router());

    if let Some(governor) = state.rate_limit_config.governor_config() {
        api = api.layer(
            GovernorLayer::new(Arc::new(governor)).error_handler(rate_limit_response),
        );
    }

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/", get(service_info))
        .nest("/api", api)
        .nest_service(UPLOADS_PREFIX, ServeDir::new(&state.app_config.upload_dir))
        .fallback(route_not_found)
        .with_state(state.clone())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(&state.cors_config))
        .layer(middleware::from_fn(logging_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_becomes_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );

        let response = panic_response(Box::new(String::from("boom")));
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limit_rejection_keeps_headers() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("9"));
        let response = rate_limit_response(GovernorError::TooManyRequests {
            wait_time: 9,
            headers: Some(headers),
        });

        assert_eq!(
            response.status(),
            axum::http::StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(response.headers()["retry-after"], "9");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }
}
