//! Database initialization
//!
//! Opens (or creates) the SQLite file and makes sure the three record tables,
//! their lookup indexes and the `updated_at` triggers exist. Every statement
//! is idempotent, so this runs on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Busy timeout applied to every connection, in milliseconds
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Record tables created by [`create_schema`]
pub const RECORD_TABLES: [&str; 3] = ["movies", "tickers", "weather"];

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets page renders read while an enrichment writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    let pragma_sql = format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS);
    sqlx::query(&pragma_sql).execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// A single connection that never expires: with `sqlite::memory:` every new
/// connection would otherwise see its own empty database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables, indexes and triggers
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_movies_table(pool).await?;
    create_tickers_table(pool).await?;
    create_weather_table(pool).await?;

    create_updated_at_trigger(pool, "movies", "movie_id").await?;
    create_updated_at_trigger(pool, "tickers", "ticker_id").await?;
    create_updated_at_trigger(pool, "weather", "weather_id").await?;

    Ok(())
}

async fn create_movies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            movie_id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            director TEXT,
            year INTEGER,
            plot TEXT,
            poster TEXT,
            actors TEXT,
            genre TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_year ON movies(year)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_tickers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tickers (
            ticker_id INTEGER PRIMARY KEY AUTOINCREMENT,
            symbol TEXT NOT NULL,
            name TEXT,
            price REAL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tickers_symbol ON tickers(symbol)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_weather_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weather (
            weather_id INTEGER PRIMARY KEY AUTOINCREMENT,
            city TEXT NOT NULL,
            state TEXT,
            temperature REAL NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_weather_city ON weather(city)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Keep `updated_at` current on every row update
async fn create_updated_at_trigger(pool: &SqlitePool, table: &str, id_column: &str) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_{table}_updated_at
        AFTER UPDATE ON {table}
        FOR EACH ROW
        WHEN NEW.updated_at = OLD.updated_at
        BEGIN
            UPDATE {table} SET updated_at = CURRENT_TIMESTAMP WHERE {id_column} = NEW.{id_column};
        END
        "#,
        table = table,
        id_column = id_column,
    );
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}
