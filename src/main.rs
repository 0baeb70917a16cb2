use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};

use classpulse::classpulse_config::Config;
use classpulse::logging::init_tracing;
use classpulse::router::init_router;
use classpulse::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();
    init_tracing(&config.app.log_dir).context("failed to create log directory")?;

    std::panic::set_hook(Box::new(|panic_info| {
        error!(panic = %panic_info, "panic");
    }));

    if let Err(e) = run(config).await {
        error!(error = ?e, "server failed to start");
        return Err(e);
    }

    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    if config.app.database_url.is_empty() {
        anyhow::bail!("DATABASE_URL must be set");
    }

    let db = classpulse::classpulse_db::init_db_pool(
        &config.app.database_url,
        config.app.database_max_connections,
    )
    .await
    .context("failed to connect to database")?;

    if config.app.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("failed to run migrations")?;
        info!("migrations applied");
    }

    tokio::fs::create_dir_all(&config.app.upload_dir)
        .await
        .context("failed to create upload directory")?;

    let bind_address = config.app.bind_address();
    let environment = config.app.environment;
    let state = AppState::new(db, config);
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!(address = %bind_address, environment = %environment, "server listening");
    info!("Swagger UI available at /swagger-ui, Scalar at /scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
