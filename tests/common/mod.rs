#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{DateTime, Utc};
use classpulse::router::init_router;
use classpulse::state::AppState;
use classpulse_auth::create_access_token;
use classpulse_config::{
    AppConfig, Config, CorsConfig, EmailConfig, Environment, JwtConfig, RateLimitConfig,
};
use classpulse_core::hash_password;
use classpulse_models::{Department, FeedbackId, Role, UserId};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "password123";

pub struct TestUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub fn test_config() -> Config {
    Config {
        app: AppConfig {
            environment: Environment::Test,
            host: "127.0.0.1".to_string(),
            port: 0,
            public_url: "http://localhost:8080".to_string(),
            upload_dir: std::env::temp_dir()
                .join(format!("classpulse-uploads-{}", Uuid::new_v4()))
                .to_string_lossy()
                .into_owned(),
            log_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            run_migrations: false,
            database_url: String::new(),
            database_max_connections: 5,
        },
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            token_expiry: 3600,
        },
        cors: CorsConfig::parse("http://localhost:3000"),
        email: EmailConfig::disabled(),
        rate_limit: RateLimitConfig::disabled(),
    }
}

pub fn setup_test_app_with_config(pool: PgPool, config: Config) -> Router {
    init_router(AppState::new(pool, config))
}

pub fn setup_test_app(pool: PgPool) -> Router {
    setup_test_app_with_config(pool, test_config())
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

/// Inserts an active user with the columns its role requires.
pub async fn create_test_user(pool: &PgPool, role: Role) -> TestUser {
    let suffix = unique_suffix();
    let username = format!("{}_{}", role.as_str(), suffix);
    let email = generate_unique_email();
    let hashed = hash_password(TEST_PASSWORD).unwrap();

    let (student_id, academic_year, department) = match role {
        Role::Student => (Some(format!("S-{}", suffix)), Some(2), None),
        Role::Teacher => (None, None, Some(Department::Physics)),
        Role::Admin => (None, None, None),
    };

    let id: UserId = sqlx::query_scalar(
        "INSERT INTO users (username, email, password, role, first_name, last_name, student_id, academic_year, department)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id",
    )
    .bind(&username)
    .bind(&email)
    .bind(&hashed)
    .bind(role)
    .bind("Test")
    .bind("User")
    .bind(student_id)
    .bind(academic_year)
    .bind(department)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        username,
        email,
        password: TEST_PASSWORD.to_string(),
        role,
    }
}

pub fn token_for(user: &TestUser) -> String {
    create_access_token(user.id.into_inner(), user.role.as_str(), &test_config().jwt).unwrap()
}

/// Inserts a feedback row directly, bypassing the API.
pub async fn create_feedback(
    pool: &PgPool,
    student: &TestUser,
    teacher: &TestUser,
    rating: i32,
    is_anonymous: bool,
) -> FeedbackId {
    sqlx::query_scalar(
        "INSERT INTO feedback (student_id, teacher_id, subject, content, rating, is_anonymous, semester, academic_year)
         VALUES ($1, $2, 'Physics', 'Great explanations in class', $3, $4, 1, '2024-2025')
         RETURNING id",
    )
    .bind(student.id)
    .bind(teacher.id)
    .bind(rating)
    .bind(is_anonymous)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn backdate_feedback(pool: &PgPool, id: FeedbackId, created_at: DateTime<Utc>) {
    sqlx::query("UPDATE feedback SET created_at = $2 WHERE id = $1")
        .bind(id)
        .bind(created_at)
        .execute(pool)
        .await
        .unwrap();
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => Body::from(serde_json::to_string(&value).unwrap()),
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
