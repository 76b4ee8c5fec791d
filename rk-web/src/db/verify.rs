//! Table verification
//!
//! Compares the live schema of a record table (via `PRAGMA table_info` and
//! `PRAGMA index_list`) with its descriptor and reports every difference.

use rk_common::Result;
use sqlx::{Row, SqliteConnection};
use std::fmt;

use crate::records::EntityKind;

/// One column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub pk: bool,
}

/// One index as reported by `PRAGMA index_list`
#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
}

/// Difference between the descriptor and the live table
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaProblem {
    MissingTable,
    MissingColumn(String),
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: String,
    },
    NullabilityMismatch {
        column: String,
        expected_not_null: bool,
    },
    MissingIndex(&'static str),
}

impl fmt::Display for SchemaProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaProblem::MissingTable => write!(f, "table does not exist"),
            SchemaProblem::MissingColumn(c) => write!(f, "column '{}' is missing", c),
            SchemaProblem::TypeMismatch {
                column,
                expected,
                actual,
            } => write!(f, "column '{}' has type {} (expected {})", column, actual, expected),
            SchemaProblem::NullabilityMismatch {
                column,
                expected_not_null,
            } => write!(
                f,
                "column '{}' should be {}",
                column,
                if *expected_not_null { "NOT NULL" } else { "nullable" }
            ),
            SchemaProblem::MissingIndex(name) => write!(f, "index '{}' is missing", name),
        }
    }
}

/// Result of verifying one table
#[derive(Debug, Clone)]
pub struct TableReport {
    pub kind: EntityKind,
    pub table: &'static str,
    pub columns: Vec<ActualColumn>,
    pub indexes: Vec<IndexInfo>,
    pub row_count: i64,
    pub problems: Vec<SchemaProblem>,
}

impl TableReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Inspect one record table
pub async fn verify_table(conn: &mut SqliteConnection, kind: EntityKind) -> Result<TableReport> {
    let d = kind.descriptor();
    let mut report = TableReport {
        kind,
        table: d.table,
        columns: Vec::new(),
        indexes: Vec::new(),
        row_count: 0,
        problems: Vec::new(),
    };

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind(d.table)
    .fetch_one(&mut *conn)
    .await?;

    if !exists {
        report.problems.push(SchemaProblem::MissingTable);
        return Ok(report);
    }

    let rows = sqlx::query(&format!("PRAGMA table_info({})", d.table))
        .fetch_all(&mut *conn)
        .await?;
    for row in &rows {
        report.columns.push(ActualColumn {
            name: row.try_get("name")?,
            type_name: row.try_get("type")?,
            not_null: row.try_get::<i64, _>("notnull")? != 0,
            pk: row.try_get::<i64, _>("pk")? != 0,
        });
    }

    let rows = sqlx::query(&format!("PRAGMA index_list({})", d.table))
        .fetch_all(&mut *conn)
        .await?;
    for row in &rows {
        report.indexes.push(IndexInfo {
            name: row.try_get("name")?,
            unique: row.try_get::<i64, _>("unique")? != 0,
        });
    }

    for expected in d.columns {
        match report.columns.iter().find(|c| c.name == expected.name) {
            None => report
                .problems
                .push(SchemaProblem::MissingColumn(expected.name.to_string())),
            Some(actual) => {
                if !actual.type_name.eq_ignore_ascii_case(expected.column_type.sql_name()) {
                    report.problems.push(SchemaProblem::TypeMismatch {
                        column: expected.name.to_string(),
                        expected: expected.column_type.sql_name(),
                        actual: actual.type_name.clone(),
                    });
                }
                if actual.not_null != expected.required {
                    report.problems.push(SchemaProblem::NullabilityMismatch {
                        column: expected.name.to_string(),
                        expected_not_null: expected.required,
                    });
                }
            }
        }
    }

    for column in [d.id_column, "created_at", "updated_at"] {
        if !report.columns.iter().any(|c| c.name == column) {
            report.problems.push(SchemaProblem::MissingColumn(column.to_string()));
        }
    }

    for index in d.expected_indexes() {
        if !report.indexes.iter().any(|i| i.name == *index) {
            report.problems.push(SchemaProblem::MissingIndex(*index));
        }
    }

    report.row_count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", d.table))
        .fetch_one(&mut *conn)
        .await?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_common::db::init_memory_database;

    #[tokio::test]
    async fn test_fresh_schema_verifies_clean() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        for kind in EntityKind::ALL {
            let report = verify_table(&mut conn, kind).await.unwrap();
            assert!(report.is_ok(), "{}: {:?}", kind, report.problems);
            assert_eq!(report.row_count, 0);
        }
    }

    #[tokio::test]
    async fn test_detects_missing_index_and_table() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        sqlx::query("DROP INDEX idx_weather_city")
            .execute(&mut *conn)
            .await
            .unwrap();
        let report = verify_table(&mut conn, EntityKind::Weather).await.unwrap();
        assert_eq!(report.problems, vec![SchemaProblem::MissingIndex("idx_weather_city")]);

        sqlx::query("DROP TABLE tickers").execute(&mut *conn).await.unwrap();
        let report = verify_table(&mut conn, EntityKind::Ticker).await.unwrap();
        assert_eq!(report.problems, vec![SchemaProblem::MissingTable]);
    }
}
