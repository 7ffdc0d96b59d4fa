use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal::auth::bootstrap::{ensure_bootstrap_admin, BootstrapOutcome};
use portal::auth::sweeper::{spawn_sweeper_task, SessionSweeper};
use portal::config::Config;
use portal::AppState;

#[derive(Parser, Debug)]
#[command(name = "portal")]
#[command(author, version, about = "Student assignment portal server", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "portal.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Password for the first admin account, used only while no admin exists
    #[arg(long, env = "PORTAL_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if cli.admin_password.is_some() {
        config.auth.bootstrap.password = cli.admin_password.clone();
    }

    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting assignment portal v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.server.data_dir.display()
        )
    })?;

    let db = portal::db::init(&config.server.data_dir).await?;
    let state = Arc::new(AppState::new(config.clone(), db));

    match ensure_bootstrap_admin(&state.admins, &config.auth.bootstrap).await? {
        BootstrapOutcome::Created(id) => tracing::info!(admin_id = id, "Bootstrap admin ready"),
        BootstrapOutcome::AlreadyPresent => {}
        BootstrapOutcome::AwaitingSetup => {
            tracing::warn!("Portal is awaiting first-run admin setup")
        }
    }

    let sweeper = SessionSweeper::new(state.users.ledger().clone(), state.admins.ledger().clone());
    spawn_sweeper_task(sweeper, &config.sessions);

    portal::api::rate_limit::spawn_cleanup_task(
        state.rate_limiter.clone(),
        config.rate_limit.cleanup_interval,
    );

    let app = portal::api::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received");
}
