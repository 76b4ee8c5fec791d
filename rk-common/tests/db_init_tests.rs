//! Tests for database initialization
//!
//! The schema must be created on first run and re-opened untouched on every
//! later run.

use rk_common::db::init::{init_database, init_memory_database, RECORD_TABLES};
use rk_common::Error;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("recordkeeper.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing_and_keeps_rows() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("recordkeeper.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO tickers (symbol, name, price) VALUES ('AAPL', 'Apple Inc.', 175.0)")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickers")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1, "Re-opening must not drop existing rows");
}

#[tokio::test]
async fn test_all_record_tables_exist() {
    let pool = init_memory_database().await.unwrap();

    for table in RECORD_TABLES {
        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(exists, 1, "table {} missing", table);
    }
}

#[tokio::test]
async fn test_lookup_indexes_exist() {
    let pool = init_memory_database().await.unwrap();

    for index in [
        "idx_movies_title",
        "idx_movies_year",
        "idx_tickers_symbol",
        "idx_weather_city",
    ] {
        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?",
        )
        .bind(index)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(exists, 1, "index {} missing", index);
    }
}

#[tokio::test]
async fn test_timestamps_are_maintained_by_database() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO weather (city, state, temperature) VALUES ('Austin', 'Texas', 78.0)")
        .execute(&pool)
        .await
        .unwrap();

    let (created, updated): (Option<String>, Option<String>) =
        sqlx::query_as("SELECT created_at, updated_at FROM weather WHERE city = 'Austin'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(created.is_some());
    assert!(updated.is_some());

    // Force a stale updated_at and check the trigger refreshes it
    sqlx::query("UPDATE weather SET updated_at = '2000-01-01 00:00:00'")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE weather SET temperature = 80.0 WHERE city = 'Austin'")
        .execute(&pool)
        .await
        .unwrap();

    let updated: String = sqlx::query_scalar("SELECT updated_at FROM weather WHERE city = 'Austin'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_ne!(updated, "2000-01-01 00:00:00");
}

#[tokio::test]
async fn test_not_null_constraint_enforced() {
    let pool = init_memory_database().await.unwrap();

    let result = sqlx::query("INSERT INTO movies (director) VALUES ('Nobody')")
        .execute(&pool)
        .await;

    assert!(result.is_err(), "title is required");
}

#[tokio::test]
async fn test_unique_violation_maps_to_conflict() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query("INSERT INTO tickers (ticker_id, symbol) VALUES (1, 'AAPL')")
        .execute(&pool)
        .await
        .unwrap();
    let err = sqlx::query("INSERT INTO tickers (ticker_id, symbol) VALUES (1, 'MSFT')")
        .execute(&pool)
        .await
        .unwrap_err();

    let err: Error = err.into();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
}
