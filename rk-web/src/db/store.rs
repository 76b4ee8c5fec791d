//! Generic record store
//!
//! One implementation of get/list/insert/update/delete/count for every
//! entity kind, driven by the kind's [`EntityDescriptor`]. Each operation
//! runs on the connection it is handed and issues a single auto-committed
//! statement.
//!
//! SQL text is assembled from descriptor names only; user values are always
//! bound as parameters.

use rk_common::{Error, Result};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection};
use tracing::debug;

use crate::records::{EntityDescriptor, EntityKind, Fields, Record, Value};

/// Fetch one row by id
pub async fn get(conn: &mut SqliteConnection, kind: EntityKind, id: i64) -> Result<Record> {
    let d = kind.descriptor();
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?",
        d.select_list(),
        d.table,
        d.id_column
    );

    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(d, id))?;

    Ok(Record::from_row(kind, &row)?)
}

/// List every row, ordered by `order_key` or the kind's default order
pub async fn list(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    order_key: Option<&str>,
) -> Result<Vec<Record>> {
    let d = kind.descriptor();
    let order_by = match order_key {
        None => d.order_by,
        Some(key) => orderable_column(d, key)?,
    };
    let sql = format!(
        "SELECT {} FROM {} ORDER BY {}, {}",
        d.select_list(),
        d.table,
        order_by,
        d.id_column
    );

    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    let records = rows
        .iter()
        .map(|row| Record::from_row(kind, row))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(kind = %kind, count = records.len(), "Listed records");
    Ok(records)
}

/// Insert a row, returning its new id
pub async fn insert(conn: &mut SqliteConnection, kind: EntityKind, fields: &Fields) -> Result<i64> {
    let d = kind.descriptor();
    validate_fields(d, fields)?;

    let columns: Vec<&str> = fields.columns().collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        d.table,
        columns.join(", "),
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for (_, value) in fields.iter() {
        query = bind_value(query, value);
    }
    let result = query.execute(&mut *conn).await?;
    let id = result.last_insert_rowid();

    debug!(kind = %kind, id, "Inserted record");
    Ok(id)
}

/// Overwrite the given columns of one row
///
/// Columns not named in `fields` are left alone. Returns `NotFound` when no
/// row has this id.
pub async fn update(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: i64,
    fields: &Fields,
) -> Result<()> {
    let d = kind.descriptor();
    if fields.is_empty() {
        return Err(Error::InvalidInput("no fields to update".to_string()));
    }
    validate_fields(d, fields)?;

    let assignments: Vec<String> = fields.columns().map(|c| format!("{} = ?", c)).collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        d.table,
        assignments.join(", "),
        d.id_column
    );

    let mut query = sqlx::query(&sql);
    for (_, value) in fields.iter() {
        query = bind_value(query, value);
    }
    let result = query.bind(id).execute(&mut *conn).await?;

    if result.rows_affected() == 0 {
        return Err(not_found(d, id));
    }

    debug!(kind = %kind, id, columns = fields.len(), "Updated record");
    Ok(())
}

/// Delete one row; `NotFound` when no row has this id
pub async fn delete(conn: &mut SqliteConnection, kind: EntityKind, id: i64) -> Result<()> {
    let d = kind.descriptor();
    let sql = format!("DELETE FROM {} WHERE {} = ?", d.table, d.id_column);

    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(not_found(d, id));
    }

    debug!(kind = %kind, id, "Deleted record");
    Ok(())
}

/// Number of rows of this kind
pub async fn count(conn: &mut SqliteConnection, kind: EntityKind) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.descriptor().table);
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
    Ok(count)
}

fn not_found(d: &EntityDescriptor, id: i64) -> Error {
    Error::NotFound(format!("{} {} = {}", d.table, d.id_column, id))
}

fn orderable_column(d: &'static EntityDescriptor, key: &str) -> Result<&'static str> {
    if key == d.id_column {
        return Ok(d.id_column);
    }
    match key {
        "created_at" => return Ok("created_at"),
        "updated_at" => return Ok("updated_at"),
        _ => {}
    }
    d.column(key)
        .map(|c| c.name)
        .ok_or_else(|| Error::InvalidInput(format!("cannot order {} by '{}'", d.table, key)))
}

/// Reject unknown columns and nulls in required columns
fn validate_fields(d: &EntityDescriptor, fields: &Fields) -> Result<()> {
    for (column, value) in fields.iter() {
        let spec = d.column(column).ok_or_else(|| {
            Error::InvalidInput(format!("unknown column '{}' for {}", column, d.table))
        })?;
        if spec.required && value.is_null() {
            return Err(Error::InvalidInput(format!("{} is required", column)));
        }
    }
    Ok(())
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Integer(i) => query.bind(*i),
        Value::Real(f) => query.bind(*f),
    }
}
