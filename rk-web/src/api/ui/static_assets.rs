//! Static asset handlers
//!
//! The stylesheet is embedded at compile time.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const STYLESHEET: &str = include_str!("../../../static/recordkeeper.css");

/// GET /static/recordkeeper.css
pub async fn serve_stylesheet() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        STYLESHEET,
    )
        .into_response()
}
