//! Shopdir - business directory service with token-based access control

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::{Config, LoggingConfig};
use shopdir_api::{create_router, AppState};
use shopdir_auth::{HashingParams, PasswordHasher, TokenService};
use shopdir_db::{Database, NewUser, Role};

/// Shopdir - business directory service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "SHOPDIR_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "SHOPDIR_PORT")]
    port: Option<u16>,

    /// Database file path
    #[arg(long, env = "SHOPDIR_DATABASE")]
    database: Option<String>,

    /// Token signing secret (at least 32 bytes)
    #[arg(long, env = "SHOPDIR_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Log level
    #[arg(long, env = "SHOPDIR_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration, then apply CLI/env overrides
    let mut config = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database) = args.database {
        config.database.path = database;
    }
    if let Some(jwt_secret) = args.jwt_secret {
        config.auth.jwt_secret = jwt_secret;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting shopdir v{}", env!("CARGO_PKG_VERSION"));

    // Refuse to start on a short signing key or bad lifetimes
    config.validate()?;

    // Initialize database
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    // Initialize token service and password hasher from validated config
    let tokens = Arc::new(TokenService::new(
        &config.auth.jwt_secret,
        config.auth.access_ttl_secs,
        config.auth.refresh_ttl_secs,
    )?);
    let hasher = Arc::new(PasswordHasher::new(HashingParams {
        memory_kib: config.auth.hash_memory_kib,
        iterations: config.auth.hash_iterations,
        parallelism: config.auth.hash_parallelism,
    })?);

    // Create default admin user if no users exist
    if !db.has_users().await? {
        info!("Creating default admin user");
        let seed_hasher = hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || seed_hasher.hash("admin"))
            .await
            .map_err(|e| anyhow::anyhow!("Hashing task failed: {}", e))??;
        db.insert_user(NewUser {
            username: "admin".to_string(),
            password_hash,
            role: Role::Admin,
        })
        .await?;
        warn!("Default admin user created (username: admin, password: admin), change the password");
    }

    // Create application state
    let state = AppState::new(db, tokens, hasher);

    // Create router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Determine bind address
    let addr: SocketAddr =
        format!("{}:{}", config.server.bind_address, config.server.port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
