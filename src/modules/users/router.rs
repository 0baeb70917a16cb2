use axum::{
    Router,
    routing::{get, patch},
};

use crate::modules::users::controller::{list_users, set_user_status, user_stats};
use crate::state::AppState;

/// Admin-only account management, mounted at `/api/users`.
pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/stats", get(user_stats))
        .route("/{id}/status", patch(set_user_status))
}
