//! Who may do what to a feedback record.

use classpulse_core::AppError;
use classpulse_models::feedback::FeedbackOwnership;
use classpulse_models::{Actor, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackAction {
    Read,
    Update,
    Delete,
}

/// The single ownership rule for feedback:
///
/// | action | author | addressed teacher | admin |
/// |--------|--------|-------------------|-------|
/// | read   | yes    | yes               | yes   |
/// | update | yes    | yes               | no    |
/// | delete | yes    | yes               | yes   |
///
/// Which fields an update may touch, and the author's edit window, are checked by
/// the service once access is granted.
pub fn can_access(actor: &Actor, resource: &FeedbackOwnership, action: FeedbackAction) -> bool {
    let is_author = actor.role == Role::Student && actor.id == resource.student_id;
    let is_recipient = actor.role == Role::Teacher && actor.id == resource.teacher_id;
    let is_admin = actor.role == Role::Admin;

    match action {
        FeedbackAction::Read | FeedbackAction::Delete => is_author || is_recipient || is_admin,
        FeedbackAction::Update => is_author || is_recipient,
    }
}

pub fn authorize(
    actor: &Actor,
    resource: &FeedbackOwnership,
    action: FeedbackAction,
) -> Result<(), AppError> {
    if can_access(actor, resource, action) {
        return Ok(());
    }

    let verb = match action {
        FeedbackAction::Read => "access",
        FeedbackAction::Update => "update",
        FeedbackAction::Delete => "delete",
    };
    Err(AppError::forbidden(format!(
        "Not authorized to {} this feedback",
        verb
    )))
}
