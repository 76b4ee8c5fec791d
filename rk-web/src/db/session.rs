//! Per-request database connection
//!
//! Handlers that touch the store take a [`DbSession`]: one pooled connection
//! acquired before the handler runs and returned to the pool when the
//! request finishes, whatever the outcome.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};
use std::ops::{Deref, DerefMut};

use crate::{ApiError, AppState};

/// A pooled connection scoped to one request
pub struct DbSession(PoolConnection<Sqlite>);

impl Deref for DbSession {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DbSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl DbSession {
    /// Take a connection from the pool
    pub async fn acquire(state: &AppState) -> Result<Self, rk_common::Error> {
        let conn = state.db.acquire().await.map_err(|e| {
            tracing::warn!(error = %e, "Could not acquire database connection");
            rk_common::Error::from(e)
        })?;
        Ok(DbSession(conn))
    }
}

/// JSON API flavour: an unreachable store is a 503 error body
#[async_trait]
impl FromRequestParts<AppState> for DbSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(DbSession::acquire(state).await?)
    }
}
