use chrono::{Duration, Utc};
use classpulse::classpulse_models::feedback::{FeedbackOwnership, within_edit_window};
use classpulse::classpulse_models::{Actor, Role, UserId};
use classpulse::modules::feedback::policy::{FeedbackAction, authorize, can_access};

struct Fixture {
    ownership: FeedbackOwnership,
    author: Actor,
    recipient: Actor,
}

fn fixture() -> Fixture {
    let student_id = UserId::new();
    let teacher_id = UserId::new();
    Fixture {
        ownership: FeedbackOwnership {
            student_id,
            teacher_id,
        },
        author: Actor {
            id: student_id,
            role: Role::Student,
        },
        recipient: Actor {
            id: teacher_id,
            role: Role::Teacher,
        },
    }
}

fn actor(role: Role) -> Actor {
    Actor {
        id: UserId::new(),
        role,
    }
}

#[test]
fn test_participants_have_full_access() {
    let f = fixture();
    for action in [FeedbackAction::Read, FeedbackAction::Update, FeedbackAction::Delete] {
        assert!(can_access(&f.author, &f.ownership, action));
        assert!(can_access(&f.recipient, &f.ownership, action));
    }
}

#[test]
fn test_admin_reads_and_deletes_but_cannot_update() {
    let f = fixture();
    let admin = actor(Role::Admin);

    assert!(can_access(&admin, &f.ownership, FeedbackAction::Read));
    assert!(can_access(&admin, &f.ownership, FeedbackAction::Delete));
    assert!(!can_access(&admin, &f.ownership, FeedbackAction::Update));
}

#[test]
fn test_outsiders_are_denied() {
    let f = fixture();
    for outsider in [actor(Role::Student), actor(Role::Teacher)] {
        for action in [FeedbackAction::Read, FeedbackAction::Update, FeedbackAction::Delete] {
            assert!(!can_access(&outsider, &f.ownership, action));
        }
    }
}

#[test]
fn test_matching_id_with_wrong_role_is_denied() {
    let f = fixture();
    let impostor = Actor {
        id: f.ownership.teacher_id,
        role: Role::Student,
    };

    assert!(!can_access(&impostor, &f.ownership, FeedbackAction::Read));
}

#[test]
fn test_authorize_messages() {
    let f = fixture();
    let outsider = actor(Role::Teacher);

    let err = authorize(&outsider, &f.ownership, FeedbackAction::Update).unwrap_err();
    assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
    assert_eq!(err.message(), "Not authorized to update this feedback");

    let err = authorize(&outsider, &f.ownership, FeedbackAction::Delete).unwrap_err();
    assert_eq!(err.message(), "Not authorized to delete this feedback");
}

#[test]
fn test_edit_window_boundary_is_inclusive() {
    let now = Utc::now();

    assert!(within_edit_window(now - Duration::days(7), now));
    assert!(!within_edit_window(now - Duration::days(7) - Duration::seconds(1), now));
    assert!(within_edit_window(now, now));
}
