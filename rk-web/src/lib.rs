//! rk-web library interface
//!
//! Exposes the router, state and workflow modules so the binaries and the
//! integration tests share one implementation.

pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod providers;
pub mod records;
pub mod seed;

pub use crate::error::{ApiError, ApiResult};

use axum::{Extension, Router};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::chat::ChatProvider;
use crate::providers::ProviderRegistry;
use crate::records::EntityKind;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Connection pool; handlers borrow one connection per request
    pub db: SqlitePool,
    /// Enrichment adapter per entity kind
    pub providers: ProviderRegistry,
    /// Language model behind the chat page
    pub chat: Arc<dyn ChatProvider>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, providers: ProviderRegistry, chat: Arc<dyn ChatProvider>) -> Self {
        Self {
            db,
            providers,
            chat,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Every entity kind gets the same HTML routes under `/<slug>` and the same
/// JSON routes under `/api/<slug>`; the kind reaches handlers as an
/// `Extension<EntityKind>`.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(api::ui_routes())
        .merge(api::chat_routes())
        .merge(api::health_routes());

    for kind in EntityKind::ALL {
        router = router
            .nest(
                &format!("/{}", kind.slug()),
                api::record_page_routes().layer(Extension(kind)),
            )
            .nest(
                &format!("/api/{}", kind.slug()),
                api::record_api_routes().layer(Extension(kind)),
            );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
