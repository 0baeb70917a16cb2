use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use uuid::Uuid;

use classpulse_models::{Department, Role, UserId};

use super::models::{SEED_EMAIL_DOMAIN, SEED_PASSWORD, StudentSeed, TeacherSeed};
use super::{BATCH_SIZE, SeedResult};

/// The fixed demo teachers created by `seed-teachers`.
const SAMPLE_TEACHERS: [(&str, &str, Department); 4] = [
    ("John", "Smith", Department::Mathematics),
    ("Mary", "Johnson", Department::English),
    ("David", "Wilson", Department::Physics),
    ("Sarah", "Brown", Department::ComputerScience),
];

fn hash_seed_password() -> SeedResult<String> {
    Ok(bcrypt::hash(SEED_PASSWORD, bcrypt::DEFAULT_COST)?)
}

/// Lower-cased ASCII letters only, so generated names always form valid handles.
fn handle_part(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Short per-run tag that keeps usernames unique across repeated seeding.
fn run_tag() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

/// Creates the four sample teachers, skipping any that already exist.
/// Returns how many were inserted.
pub async fn seed_sample_teachers(db: &PgPool) -> SeedResult<usize> {
    let password = hash_seed_password()?;
    let mut created = 0;

    for (first_name, last_name, department) in SAMPLE_TEACHERS {
        let username = format!("{}.{}", handle_part(first_name), handle_part(last_name));
        let email = format!("{}@{}", username, SEED_EMAIL_DOMAIN);

        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password, role, first_name, last_name, department)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT DO NOTHING",
        )
        .bind(UserId::new())
        .bind(&username)
        .bind(&email)
        .bind(&password)
        .bind(Role::Teacher)
        .bind(first_name)
        .bind(last_name)
        .bind(department)
        .execute(db)
        .await?;

        if result.rows_affected() == 1 {
            println!("  ➕ {} {} ({})", first_name, last_name, email);
            created += 1;
        } else {
            println!("  ⏭️  {} {} already exists", first_name, last_name);
        }
    }

    Ok(created)
}

fn generate_teachers(count: usize) -> Vec<TeacherSeed> {
    let tag = run_tag();
    (0..count)
        .into_par_iter()
        .map(|i| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let username = format!(
                "{}.{}.{}{}",
                handle_part(&first_name),
                handle_part(&last_name),
                tag,
                i
            );
            let department = Department::ALL[(0..Department::ALL.len()).fake::<usize>()];
            TeacherSeed {
                id: UserId::new(),
                email: format!("{}@{}", username, SEED_EMAIL_DOMAIN),
                username,
                first_name,
                last_name,
                department,
            }
        })
        .collect()
}

fn generate_students(count: usize) -> Vec<StudentSeed> {
    let tag = run_tag();
    (0..count)
        .into_par_iter()
        .map(|i| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let username = format!(
                "{}.{}.{}{}",
                handle_part(&first_name),
                handle_part(&last_name),
                tag,
                i
            );
            StudentSeed {
                id: UserId::new(),
                email: format!("{}@{}", username, SEED_EMAIL_DOMAIN),
                username,
                first_name,
                last_name,
                student_id: format!("SEED-{}-{:05}", tag.to_uppercase(), i),
                academic_year: (1..=4).fake::<i32>(),
            }
        })
        .collect()
}

pub async fn seed_teachers(db: &PgPool, count: usize) -> SeedResult<Vec<UserId>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let start = Instant::now();
    let password = hash_seed_password()?;
    let teachers = generate_teachers(count);

    let mut tx = db.begin().await?;
    for chunk in teachers.chunks(BATCH_SIZE) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO users (id, username, email, password, role, first_name, last_name, department) ",
        );
        qb.push_values(chunk, |mut row, t| {
            row.push_bind(t.id)
                .push_bind(&t.username)
                .push_bind(&t.email)
                .push_bind(&password)
                .push_bind(Role::Teacher)
                .push_bind(&t.first_name)
                .push_bind(&t.last_name)
                .push_bind(t.department);
        });
        qb.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!("  👩‍🏫 {} teachers in {:.2?}", count, start.elapsed());
    Ok(teachers.into_iter().map(|t| t.id).collect())
}

pub async fn seed_students(db: &PgPool, count: usize) -> SeedResult<Vec<UserId>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let start = Instant::now();
    let password = hash_seed_password()?;
    let students = generate_students(count);

    let mut tx = db.begin().await?;
    for chunk in students.chunks(BATCH_SIZE) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO users (id, username, email, password, role, first_name, last_name, student_id, academic_year) ",
        );
        qb.push_values(chunk, |mut row, s| {
            row.push_bind(s.id)
                .push_bind(&s.username)
                .push_bind(&s.email)
                .push_bind(&password)
                .push_bind(Role::Student)
                .push_bind(&s.first_name)
                .push_bind(&s.last_name)
                .push_bind(&s.student_id)
                .push_bind(s.academic_year);
        });
        qb.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    println!("  🎓 {} students in {:.2?}", count, start.elapsed());
    Ok(students.into_iter().map(|s| s.id).collect())
}
