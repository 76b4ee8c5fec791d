//! Database connection for the HTML pages
//!
//! Same pooled connection as [`DbSession`], but an unreachable store renders
//! a 503 page with the usual layout instead of a JSON error body.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
};
use sqlx::SqliteConnection;
use std::ops::{Deref, DerefMut};

use super::flash::Flash;
use super::html::layout;
use crate::db::DbSession;
use crate::AppState;

pub const STORE_DOWN_MESSAGE: &str = "Database connection failed.";

/// A pooled connection for one page request
pub struct PageSession(DbSession);

impl Deref for PageSession {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PageSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for PageSession {
    type Rejection = Response;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        DbSession::acquire(state)
            .await
            .map(PageSession)
            .map_err(|_| store_unavailable_page())
    }
}

/// 503 page shown when no connection can be had
pub fn store_unavailable_page() -> Response {
    let flash = Flash::error(STORE_DOWN_MESSAGE);
    let content = r#"<h2>Records unavailable</h2>
        <p>The record store cannot be reached right now. <a href="/">Try again</a> shortly.</p>"#;
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(layout("Unavailable", Some(&flash), content)),
    )
        .into_response()
}
