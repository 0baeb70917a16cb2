use chrono::{Duration, Utc};
use fake::faker::lorem::en::Sentence;
use fake::{Fake, Faker};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;

use classpulse_models::feedback::FeedbackStatus;
use classpulse_models::{FeedbackId, UserId};

use super::models::{FeedbackSeed, SUBJECTS};
use super::{BATCH_SIZE, SeedResult};

/// Seeded feedback is spread over this many past days so trends have data.
const HISTORY_DAYS: i64 = 90;
const MAX_CONTENT_CHARS: usize = 1000;

fn generate_content() -> String {
    let mut content: String = Sentence(8..16).fake();
    while content.chars().count() < 10 {
        content.push(' ');
        content.push_str(&Sentence(4..8).fake::<String>());
    }
    content.chars().take(MAX_CONTENT_CHARS).collect()
}

fn academic_year_label(start: i32) -> String {
    format!("{}-{}", start, start + 1)
}

fn generate_feedback(students: &[UserId], teachers: &[UserId], count: usize) -> Vec<FeedbackSeed> {
    let now = Utc::now();
    let base_year = (2022..2025).fake::<i32>();

    (0..count)
        .into_par_iter()
        .map(|_| FeedbackSeed {
            id: FeedbackId::new(),
            student_id: students[(0..students.len()).fake::<usize>()],
            teacher_id: teachers[(0..teachers.len()).fake::<usize>()],
            subject: SUBJECTS[(0..SUBJECTS.len()).fake::<usize>()],
            content: generate_content(),
            rating: (1..=5).fake::<i32>(),
            semester: (1..=4).fake::<i32>(),
            academic_year: academic_year_label(base_year + (0..2).fake::<i32>()),
            is_anonymous: Faker.fake::<bool>(),
            created_at: now - Duration::minutes((0..HISTORY_DAYS * 24 * 60).fake::<i64>()),
        })
        .collect()
}

/// Inserts `count` random feedback entries between the given students and teachers.
pub async fn seed_feedback(
    db: &PgPool,
    students: &[UserId],
    teachers: &[UserId],
    count: usize,
) -> SeedResult<()> {
    if count == 0 {
        return Ok(());
    }
    if students.is_empty() || teachers.is_empty() {
        println!("  ⚠️  Skipping feedback: needs at least one student and one teacher");
        return Ok(());
    }

    let start = Instant::now();
    let entries = generate_feedback(students, teachers, count);

    let mut tx = db.begin().await?;
    for chunk in entries.chunks(BATCH_SIZE) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO feedback (id, student_id, teacher_id, subject, content, rating, status, \
             is_anonymous, semester, academic_year, created_at, updated_at) ",
        );
        qb.push_values(chunk, |mut row, f| {
            row.push_bind(f.id)
                .push_bind(f.student_id)
                .push_bind(f.teacher_id)
                .push_bind(f.subject)
                .push_bind(&f.content)
                .push_bind(f.rating)
                .push_bind(FeedbackStatus::Pending)
                .push_bind(f.is_anonymous)
                .push_bind(f.semester)
                .push_bind(&f.academic_year)
                .push_bind(f.created_at)
                .push_bind(f.created_at);
        });
        qb.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!("  📝 {} feedback entries in {:.2?}", count, start.elapsed());
    Ok(())
}
