mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use classpulse_models::Role;
use common::{
    backdate_feedback, body_json, create_feedback, create_test_user, json_request, setup_test_app,
    token_for,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

fn feedback_payload(teacher: &str) -> serde_json::Value {
    json!({
        "teacher": teacher,
        "subject": "Computer Science",
        "content": "The lectures on graphs were very clear.",
        "rating": 4,
        "semester": 2,
        "academicYear": "2024-2025",
        "isAnonymous": false
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_creates_feedback(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/feedback",
            Some(&token_for(&student)),
            Some(feedback_payload(&teacher.id.to_string())),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["subject"], "Computer Science");
    assert_eq!(body["data"]["teacher"]["id"], teacher.id.to_string());
    assert_eq!(body["data"]["student"]["id"], student.id.to_string());
    assert_eq!(body["data"]["age"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_cannot_create_feedback(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let other = create_test_user(&pool, Role::Teacher).await;
    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/feedback",
            Some(&token_for(&teacher)),
            Some(feedback_payload(&other.id.to_string())),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_feedback_validation(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let other_student = create_test_user(&pool, Role::Student).await;
    let app = setup_test_app(pool.clone());
    let token = token_for(&student);

    let mut bad_rating = feedback_payload(&teacher.id.to_string());
    bad_rating["rating"] = json!(6);
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/feedback", Some(&token), Some(bad_rating)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Rating must be between 1 and 5");

    let mut short = feedback_payload(&teacher.id.to_string());
    short["content"] = json!("too short");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/feedback", Some(&token), Some(short)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad_year = feedback_payload(&teacher.id.to_string());
    bad_year["academicYear"] = json!("2024-2026");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/feedback", Some(&token), Some(bad_year)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // a student id is not a valid teacher reference
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/feedback",
            Some(&token),
            Some(feedback_payload(&other_student.id.to_string())),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid teacher selected");
    assert_eq!(body["error"], "InvalidReference");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_is_scoped_by_role(pool: PgPool) {
    let student_a = create_test_user(&pool, Role::Student).await;
    let student_b = create_test_user(&pool, Role::Student).await;
    let teacher_a = create_test_user(&pool, Role::Teacher).await;
    let teacher_b = create_test_user(&pool, Role::Teacher).await;
    let admin = create_test_user(&pool, Role::Admin).await;

    create_feedback(&pool, &student_a, &teacher_a, 5, false).await;
    create_feedback(&pool, &student_a, &teacher_b, 3, false).await;
    create_feedback(&pool, &student_b, &teacher_a, 2, false).await;

    let app = setup_test_app(pool.clone());

    let expectations = [
        (&student_a, 2),
        (&student_b, 1),
        (&teacher_a, 2),
        (&teacher_b, 1),
        (&admin, 3),
    ];
    for (user, expected) in expectations {
        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/feedback", Some(&token_for(user)), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], expected, "role {:?}", user.role);
        assert_eq!(body["count"], expected);
    }

    let response = app
        .oneshot(json_request(
            "GET",
            &format!("/api/feedback?teacher={}", teacher_b.id),
            Some(&token_for(&admin)),
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_sort_select_and_paginate(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let teacher = create_test_user(&pool, Role::Teacher).await;
    for rating in [3, 1, 5, 4, 2] {
        create_feedback(&pool, &student, &teacher, rating, false).await;
    }
    let app = setup_test_app(pool.clone());
    let token = token_for(&student);

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/feedback?sort=-rating&select=rating&limit=2&page=1",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["count"], 2);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data[0]["rating"], 5);
    assert_eq!(data[1]["rating"], 4);
    let keys: Vec<&String> = data[0].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert!(data[0].get("id").is_some());
    assert_eq!(body["pagination"]["next"]["page"], 2);
    assert!(body["pagination"].get("prev").is_none());

    let response = app
        .oneshot(json_request(
            "GET",
            "/api/feedback?sort=-rating&limit=2&page=3",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["rating"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_rejects_malformed_filters_as_json(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let app = setup_test_app(pool.clone());
    let token = token_for(&student);

    for (uri, message) in [
        ("/api/feedback?status=bogus", "Invalid value: bogus"),
        ("/api/feedback?subject=Astrology", "Invalid value: Astrology"),
        ("/api/feedback?page=abc", "Invalid query parameters"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("GET", uri, Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            response.headers()["content-type"],
            "application/json",
            "{uri}"
        );
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(body["message"], message);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_far_page_is_empty(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let teacher = create_test_user(&pool, Role::Teacher).await;
    create_feedback(&pool, &student, &teacher, 4, false).await;
    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "GET",
            &format!("/api/feedback?page={}", i64::MAX),
            Some(&token_for(&student)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["total"], 1);
    assert!(body["pagination"].get("next").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_anonymous_feedback_hides_student_from_teacher(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let admin = create_test_user(&pool, Role::Admin).await;
    let id = create_feedback(&pool, &student, &teacher, 4, true).await;
    let app = setup_test_app(pool.clone());
    let uri = format!("/api/feedback/{}", id);

    let response = app
        .clone()
        .oneshot(json_request("GET", &uri, Some(&token_for(&teacher)), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"].get("student").is_none());
    assert_eq!(body["data"]["isAnonymous"], true);

    for viewer in [&student, &admin] {
        let response = app
            .clone()
            .oneshot(json_request("GET", &uri, Some(&token_for(viewer)), None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["student"]["id"], student.id.to_string());
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_is_idempotent_and_authorized(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let stranger = create_test_user(&pool, Role::Teacher).await;
    let id = create_feedback(&pool, &student, &teacher, 4, false).await;
    let app = setup_test_app(pool.clone());
    let uri = format!("/api/feedback/{}", id);
    let token = token_for(&student);

    let first = body_json(
        app.clone()
            .oneshot(json_request("GET", &uri, Some(&token), None))
            .await
            .unwrap(),
    )
    .await;
    let second = body_json(
        app.clone()
            .oneshot(json_request("GET", &uri, Some(&token), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first, second);

    let response = app
        .clone()
        .oneshot(json_request("GET", &uri, Some(&token_for(&stranger)), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Not authorized to access this feedback");

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/feedback/{}", uuid::Uuid::new_v4()),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(json_request("GET", "/api/feedback/not-a-uuid", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_edit_window(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let id = create_feedback(&pool, &student, &teacher, 2, false).await;
    let app = setup_test_app(pool.clone());
    let uri = format!("/api/feedback/{}", id);
    let token = token_for(&student);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "rating": 3, "status": "archived" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["rating"], 3);
    // students cannot change status
    assert_eq!(body["data"]["status"], "pending");

    backdate_feedback(&pool, id, Utc::now() - Duration::days(8)).await;

    let response = app
        .oneshot(json_request("PUT", &uri, Some(&token), Some(json!({ "rating": 5 }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "EditWindowExpired");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_responds_to_feedback(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let other_teacher = create_test_user(&pool, Role::Teacher).await;
    let admin = create_test_user(&pool, Role::Admin).await;
    let id = create_feedback(&pool, &student, &teacher, 2, false).await;
    backdate_feedback(&pool, id, Utc::now() - Duration::days(30)).await;
    let app = setup_test_app(pool.clone());
    let uri = format!("/api/feedback/{}", id);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            Some(&token_for(&teacher)),
            Some(json!({ "status": "reviewed", "teacherResponse": "Thanks, noted.", "rating": 5 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "reviewed");
    assert_eq!(body["data"]["teacherResponse"], "Thanks, noted.");
    // teachers cannot change the rating
    assert_eq!(body["data"]["rating"], 2);

    for outsider in [&other_teacher, &admin] {
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &uri,
                Some(&token_for(outsider)),
                Some(json!({ "status": "archived" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_feedback(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let other_student = create_test_user(&pool, Role::Student).await;
    let admin = create_test_user(&pool, Role::Admin).await;
    let own = create_feedback(&pool, &student, &teacher, 4, false).await;
    let for_admin = create_feedback(&pool, &student, &teacher, 1, false).await;
    let app = setup_test_app(pool.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/feedback/{}", own),
            Some(&token_for(&other_student)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/feedback/{}", own),
            Some(&token_for(&student)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Feedback deleted successfully");

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/feedback/{}", for_admin),
            Some(&token_for(&admin)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
