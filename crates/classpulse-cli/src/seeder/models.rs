//! Seed rows and seeding configuration.

use chrono::{DateTime, Utc};
use classpulse_models::feedback::Subject;
use classpulse_models::{Department, FeedbackId, UserId};

/// Every seeded account uses this email domain; `clear-seed` deletes by it.
pub const SEED_EMAIL_DOMAIN: &str = "seed.classpulse.test";

/// Password of every seeded account.
pub const SEED_PASSWORD: &str = "password123";

pub const SUBJECTS: [Subject; 10] = [
    Subject::Mathematics,
    Subject::Physics,
    Subject::Chemistry,
    Subject::Biology,
    Subject::ComputerScience,
    Subject::English,
    Subject::History,
    Subject::Geography,
    Subject::Economics,
    Subject::Other,
];

pub struct TeacherSeed {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub department: Department,
}

pub struct StudentSeed {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
    pub academic_year: i32,
}

pub struct FeedbackSeed {
    pub id: FeedbackId,
    pub student_id: UserId,
    pub teacher_id: UserId,
    pub subject: Subject,
    pub content: String,
    pub rating: i32,
    pub semester: i32,
    pub academic_year: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub teachers: usize,
    pub students: usize,
    pub feedback: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            teachers: 5,
            students: 40,
            feedback: 200,
        }
    }
}
