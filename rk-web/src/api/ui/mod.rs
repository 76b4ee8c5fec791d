//! UI Routes - server-rendered HTML pages
//!
//! # Structure
//! - **Static Assets** (`static_assets`): stylesheet
//! - **Root Page** (`root`): landing page with links to each record list
//! - **Record Pages** (`records`): list, detail, edit and the form posts,
//!   mounted once per entity kind
//! - **Chatbot** (`chatbot`): question form and rendered answer
//!
//! Pages that need the database take a [`session::PageSession`], which
//! answers with a 503 page when the store is unreachable.
//!
//! Form posts answer with a 303 redirect and carry their outcome in a
//! one-shot flash cookie (`flash`).

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod flash;
pub mod html;
pub mod session;

mod chatbot;
mod records;
mod root;
mod static_assets;

use chatbot::{ask_page, chatbot_page};
use records::{
    add_record, delete_record, detail_page, edit_page, edit_record, enrich_record, list_page,
};
use root::root_page;
use static_assets::serve_stylesheet;

/// Build top-level UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/chatbot", get(chatbot_page))
        .route("/chatbot/ask", post(ask_page))
        .route("/static/recordkeeper.css", get(serve_stylesheet))
}

/// Build record page routes for one kind (mounted under `/<slug>`)
pub fn record_page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_page))
        .route("/add", post(add_record))
        .route("/:id", get(detail_page))
        .route("/:id/edit", get(edit_page).post(edit_record))
        .route("/:id/enrich", post(enrich_record))
        .route("/:id/delete", post(delete_record))
}
