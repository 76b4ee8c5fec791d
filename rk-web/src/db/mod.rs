//! Database access for rk-web
//!
//! Schema creation lives in rk-common; this module holds the generic record
//! store, the per-request connection extractor and table verification.

pub mod session;
pub mod store;
pub mod verify;

pub use session::DbSession;

use rk_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open the database pool, creating the file and schema if needed
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());
    rk_common::db::init_database(db_path).await
}
