use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use classpulse_core::file_storage::MAX_UPLOAD_BYTES;

use super::controller::{
    forgot_password, login, me, register, reset_password, update_password,
};
use crate::modules::users::controller::{list_teachers, update_profile, upload_profile_picture};
use crate::state::AppState;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/update-profile", put(update_profile))
        .route("/updatepassword", put(update_password))
        .route(
            "/upload-profile-picture",
            post(upload_profile_picture)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/teachers", get(list_teachers))
        .route("/forgotpassword", post(forgot_password))
        .route("/resetpassword/{resettoken}", put(reset_password))
}
