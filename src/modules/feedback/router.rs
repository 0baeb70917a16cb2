use axum::{Router, routing::get};

use super::controller::{
    create_feedback, delete_feedback, get_feedback, list_feedback, update_feedback,
};
use crate::modules::analytics::controller::get_analytics;
use crate::state::AppState;

pub fn init_feedback_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_feedback).post(create_feedback))
        .route("/analytics", get(get_analytics))
        .route(
            "/{id}",
            get(get_feedback).put(update_feedback).delete(delete_feedback),
        )
}
