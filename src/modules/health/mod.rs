//! Liveness endpoint and service banner.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    /// Always `OK` while the process serves requests
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    /// `connected` or `disconnected`
    pub database: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub success: bool,
    pub name: String,
    pub version: String,
    pub docs: String,
}

/// Process and database health. Always 200; the database state is reported in the body
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service health", body = HealthResponse)),
    tag = "Health"
)]
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if classpulse_db::ping(&state.db).await {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        success: true,
        status: "OK".to_string(),
        timestamp: Utc::now(),
        environment: state.app_config.environment.to_string(),
        database: database.to_string(),
    })
}

pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        success: true,
        name: "Classpulse API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs: "/swagger-ui".to_string(),
    })
}

pub fn init_health_router() -> Router<AppState> {
    Router::new().route("/", get(health))
}
