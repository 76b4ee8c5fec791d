//! Landing page

use axum::{extract::State, response::Response};

use super::flash::IncomingFlash;
use super::html::{escape_html, layout};
use crate::db::store;
use crate::records::EntityKind;
use crate::AppState;

/// GET /
///
/// One card per record kind with its row count. Counts show "?" when the
/// database cannot be reached so the page itself still renders.
pub async fn root_page(State(state): State<AppState>, flash: IncomingFlash) -> Response {
    let mut cards = String::new();

    let mut conn = state.db.acquire().await.ok();
    for kind in EntityKind::ALL {
        let count = match conn.as_mut() {
            Some(conn) => store::count(conn, kind)
                .await
                .map(|n| n.to_string())
                .unwrap_or_else(|_| "?".to_string()),
            None => "?".to_string(),
        };
        cards.push_str(&format!(
            r#"<tr><td><a href="/{slug}">{label}</a></td><td>{count}</td><td><a href="/api/{slug}">JSON</a></td></tr>"#,
            slug = kind.slug(),
            label = escape_html(kind.label()),
            count = count,
        ));
    }

    let content = format!(
        r#"<h2>Records</h2>
        <table>
            <thead><tr><th>Collection</th><th>Rows</th><th>API</th></tr></thead>
            <tbody>{cards}</tbody>
        </table>
        <p>Ask a question on the <a href="/chatbot">chatbot</a> page.</p>"#,
        cards = cards
    );

    flash.render(layout("Home", flash.current(), &content))
}
