//! rk-web - RecordKeeper web service
//!
//! Serves the HTML pages, the JSON record API, the chat endpoint and
//! `/health` on one listener.

use anyhow::{Context, Result};
use clap::Parser;
use rk_common::config::{load_toml_config, BIND_ADDRESS_ENV, DATABASE_PATH_ENV, ROOT_FOLDER_ENV};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rk_web::chat::GroqClient;
use rk_web::config::{CliOverrides, ServiceConfig};
use rk_web::providers::ProviderRegistry;
use rk_web::AppState;

#[derive(Debug, Parser)]
#[command(name = "rk-web", version, about = "RecordKeeper web service")]
struct Args {
    /// TOML config file (default: ~/.config/recordkeeper/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder holding the database
    #[arg(long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// Database file, overrides <root_folder>/recordkeeper.db
    #[arg(long, env = DATABASE_PATH_ENV)]
    database_path: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = BIND_ADDRESS_ENV)]
    bind_address: Option<String>,

    /// Timeout in seconds for each provider request
    #[arg(long)]
    provider_timeout_secs: Option<u64>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            root_folder: self.root_folder.clone(),
            database_path: self.database_path.clone(),
            bind_address: self.bind_address.clone(),
            provider_timeout_secs: self.provider_timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting rk-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = ServiceConfig::resolve(&args.overrides(), &toml_config);
    config.log_summary();

    let db_pool = rk_web::db::init_database_pool(&config.database_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    let providers = ProviderRegistry::from_settings(&config.providers)
        .context("Failed to build provider HTTP client")?;
    let chat = GroqClient::from_settings(&config.chat)
        .context("Failed to build chat HTTP client")?;

    let state = AppState::new(db_pool.clone(), providers, Arc::new(chat));
    let app = rk_web::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    info!("rk-web stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown requested");
}
