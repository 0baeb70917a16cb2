use axum::{Router, routing::get};

use super::controller::get_analytics;
use crate::state::AppState;

pub fn init_analytics_router() -> Router<AppState> {
    Router::new().route("/", get(get_analytics))
}
