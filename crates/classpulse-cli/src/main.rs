use classpulse_cli::seeder::{self, SEED_EMAIL_DOMAIN, SEED_PASSWORD, SeedConfig, SeedResult};
use classpulse_models::users::normalize_username;
use classpulse_models::value_types::Email;
use classpulse_models::{Role, UserId};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "classpulse-cli")]
#[command(about = "Classpulse CLI - Administrative tools for Classpulse", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// Login username
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// First name of the admin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the admin
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Create the four sample teachers (idempotent)
    SeedTeachers,
    /// Seed the database with fake teachers, students, and feedback
    Seed {
        /// Number of teachers to create
        #[arg(short = 't', long, default_value = "5")]
        teachers: usize,

        /// Number of students to create
        #[arg(short = 's', long, default_value = "40")]
        students: usize,

        /// Number of feedback entries to create
        #[arg(short = 'n', long, default_value = "200")]
        feedback: usize,
    },
    /// Delete every seeded account and its feedback (keeps real users)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match connect().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::CreateAdmin {
            username,
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&pool, username, first_name, last_name, email, password).await,
        Commands::SeedTeachers => handle_seed_teachers(&pool).await,
        Commands::Seed {
            teachers,
            students,
            feedback,
        } => {
            seeder::seed_all(
                &pool,
                SeedConfig {
                    teachers,
                    students,
                    feedback,
                },
            )
            .await
        }
        Commands::ClearSeed => handle_clear_seed(&pool).await,
    };

    if let Err(e) = result {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn connect() -> SeedResult<PgPool> {
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {}", e))?;

    Ok(pool)
}

fn prompt(value: Option<String>, label: &str) -> SeedResult<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(label).interact_text()?),
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> SeedResult<()> {
    let username = normalize_username(&prompt(username, "Username")?, "Username is required")
        .map_err(|e| e.message())?;
    let first_name = prompt(first_name, "First name")?;
    let last_name = prompt(last_name, "Last name")?;
    let email = Email::new(prompt(email, "Email address")?)?;

    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };
    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters".into());
    }

    let hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;

    let result = sqlx::query(
        "INSERT INTO users (id, username, email, password, role, first_name, last_name)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT DO NOTHING",
    )
    .bind(UserId::new())
    .bind(&username)
    .bind(email.as_str())
    .bind(&hash)
    .bind(Role::Admin)
    .bind(first_name.trim())
    .bind(last_name.trim())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err("A user with that email or username already exists".into());
    }

    println!("\n✅ Admin created successfully!");
    println!("   Username: {}", username);
    println!("   Email: {}", email);
    println!("   Name: {} {}", first_name.trim(), last_name.trim());
    Ok(())
}

async fn handle_seed_teachers(pool: &PgPool) -> SeedResult<()> {
    println!("🌱 Creating sample teachers...");
    let created = seeder::users::seed_sample_teachers(pool).await?;
    println!(
        "\n✅ {} teacher(s) created. Sample accounts use password '{}'",
        created, SEED_PASSWORD
    );
    Ok(())
}

async fn handle_clear_seed(pool: &PgPool) -> SeedResult<()> {
    println!("🧹 Removing accounts under @{}...", SEED_EMAIL_DOMAIN);
    let removed = seeder::clear_seeded_data(pool).await?;
    println!("\n✅ Removed {} seeded account(s)", removed);
    Ok(())
}
