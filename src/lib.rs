pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod seed;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use config::Config;
use db::Store;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve") => run_server(config).await,

        Some("seed") => run_seed(config).await,

        Some("init" | "--init") => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }

        Some(other) => {
            println!("Unknown command: {other}");
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("HFRAT - Health Facility Resource Availability Tracker");
    println!("Role-scoped API for facility resource reporting");
    println!();
    println!("USAGE:");
    println!("  hfrat [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("  serve             Run the API server (default)");
    println!("  seed              Seed sample facilities and users");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("  DATABASE_URL            Database connection string");
    println!("  HFRAT_PORT / PORT       Listen port");
    println!("  JWT_SECRET_KEY          Token signing secret");
    println!("  CORS_ALLOWED_ORIGINS    Comma-separated origin allowlist");
    println!("  DEFAULT_ADMIN_EMAIL     Seeded admin email (first run)");
    println!("  DEFAULT_ADMIN_PASSWORD  Seeded admin password (first run)");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the server, database and security.");
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("HFRAT v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let port = config.server.port;
    let state = api::AppState::new(store, config)?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 API server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }
}

async fn run_seed(config: Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;
    seed::seed_sample_data(&store, &config.security).await?;
    println!("✓ Sample data seeded.");
    Ok(())
}
