//! rk-admin - RecordKeeper maintenance CLI
//!
//! ```text
//! rk-admin init                         create tables, indexes and triggers
//! rk-admin seed <kind|all> [--force]    insert the sample rows
//! rk-admin verify [kind]                compare live tables with the schema
//! rk-admin probe <kind> <key> [--hint]  run one provider lookup
//! rk-admin models                       list language models
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rk_common::config::{load_toml_config, DATABASE_PATH_ENV, ROOT_FOLDER_ENV};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rk_web::chat::{ChatProvider, GroqClient};
use rk_web::config::{CliOverrides, ServiceConfig};
use rk_web::db::verify::verify_table;
use rk_web::providers::ProviderRegistry;
use rk_web::records::{EntityKind, NaturalKey};
use rk_web::seed::{seed, SeedOutcome};

#[derive(Debug, Parser)]
#[command(name = "rk-admin", version, about = "RecordKeeper maintenance")]
struct Cli {
    /// TOML config file (default: ~/.config/recordkeeper/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding the database
    #[arg(long, global = true, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// Database file, overrides <root_folder>/recordkeeper.db
    #[arg(long, global = true, env = DATABASE_PATH_ENV)]
    database_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the record tables, indexes and triggers
    Init,

    /// Insert sample rows
    Seed {
        /// movies, tickers, weather or all
        target: String,

        /// Insert even when the table already has rows
        #[arg(long)]
        force: bool,
    },

    /// Check columns, types, nullability and indexes
    Verify {
        /// Limit to one kind
        kind: Option<EntityKind>,
    },

    /// Run one provider lookup without touching the database
    Probe {
        kind: EntityKind,

        /// Title, symbol or city
        key: String,

        /// State, for weather lookups
        #[arg(long)]
        hint: Option<String>,
    },

    /// List the models offered by the chat provider
    Models,
}

/// Kinds named by a seed target
fn seed_targets(target: &str) -> Result<Vec<EntityKind>> {
    if target.eq_ignore_ascii_case("all") {
        return Ok(EntityKind::ALL.to_vec());
    }
    match EntityKind::from_slug(target) {
        Some(kind) => Ok(vec![kind]),
        None => bail!("unknown seed target '{}' (expected movies, tickers, weather or all)", target),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let toml_config = load_toml_config(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(
        "rk-admin v{} [{}] built {}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let overrides = CliOverrides {
        root_folder: cli.root_folder.clone(),
        database_path: cli.database_path.clone(),
        ..Default::default()
    };
    let config = ServiceConfig::resolve(&overrides, &toml_config);

    match cli.command {
        Command::Init => {
            let pool = rk_web::db::init_database_pool(&config.database_path)
                .await
                .context("Failed to initialize database")?;
            println!("Database ready: {}", config.database_path.display());
            pool.close().await;
        }

        Command::Seed { target, force } => {
            let kinds = seed_targets(&target)?;
            let pool = rk_web::db::init_database_pool(&config.database_path).await?;
            let mut conn = pool.acquire().await?;
            for kind in kinds {
                match seed(&mut conn, kind, force).await? {
                    SeedOutcome::Inserted { kind, count } => {
                        println!("{}: inserted {} sample rows", kind, count)
                    }
                    SeedOutcome::Skipped { kind, existing } => println!(
                        "{}: {} rows already present, skipped (use --force to append)",
                        kind, existing
                    ),
                }
            }
            drop(conn);
            pool.close().await;
        }

        Command::Verify { kind } => {
            let kinds = kind.map(|k| vec![k]).unwrap_or_else(|| EntityKind::ALL.to_vec());
            let pool = rk_web::db::init_database_pool(&config.database_path).await?;
            let mut conn = pool.acquire().await?;

            let mut failed = 0;
            for kind in kinds {
                let report = verify_table(&mut conn, kind).await?;
                println!("{} ({} rows)", report.table, report.row_count);
                for column in &report.columns {
                    println!(
                        "  {:<12} {:<8} {}{}",
                        column.name,
                        column.type_name,
                        if column.not_null { "NOT NULL" } else { "NULL" },
                        if column.pk { " PRIMARY KEY" } else { "" }
                    );
                }
                for index in &report.indexes {
                    println!(
                        "  index {}{}",
                        index.name,
                        if index.unique { " (unique)" } else { "" }
                    );
                }
                if report.is_ok() {
                    println!("  OK");
                } else {
                    failed += 1;
                    for problem in &report.problems {
                        println!("  PROBLEM: {}", problem);
                    }
                }
            }
            drop(conn);
            pool.close().await;

            if failed > 0 {
                bail!("{} table(s) failed verification", failed);
            }
        }

        Command::Probe { kind, key, hint } => {
            let registry = ProviderRegistry::from_settings(&config.providers)?;
            let adapter = registry
                .get(kind)
                .with_context(|| format!("no provider registered for {}", kind))?;
            let natural_key = NaturalKey::new(key, hint);

            match adapter.fetch(&natural_key).await {
                Ok(enrichment) => {
                    println!("{}: {}", adapter.name(), enrichment.summary());
                    println!("{}", serde_json::to_string_pretty(&enrichment)?);
                }
                Err(err) => bail!("{} lookup failed [{}]: {}", adapter.name(), err.class(), err),
            }
        }

        Command::Models => {
            let client = GroqClient::from_settings(&config.chat)?;
            let models = client
                .list_models()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            for model in models {
                let marker = if model == client.model() { " (default)" } else { "" };
                println!("{}{}", model, marker);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_targets() {
        assert_eq!(seed_targets("all").unwrap().len(), 3);
        assert_eq!(seed_targets("tickers").unwrap(), vec![EntityKind::Ticker]);
        assert!(seed_targets("albums").is_err());
    }

    #[test]
    fn test_cli_parses_probe() {
        let cli = Cli::try_parse_from(["rk-admin", "probe", "weather", "Atlanta", "--hint", "GA"])
            .unwrap();
        match cli.command {
            Command::Probe { kind, key, hint } => {
                assert_eq!(kind, EntityKind::Weather);
                assert_eq!(key, "Atlanta");
                assert_eq!(hint.as_deref(), Some("GA"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
