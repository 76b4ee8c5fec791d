//! HTTP handlers for rk-web
//!
//! JSON API (`/api/...`), server-rendered pages, and the health check.

pub mod chat;
pub mod health;
pub mod records;
pub mod ui;

pub use chat::chat_routes;
pub use health::health_routes;
pub use records::record_api_routes;
pub use ui::{record_page_routes, ui_routes};
