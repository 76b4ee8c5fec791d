//! HTML helpers: escaping and the shared page layout

use super::flash::Flash;
use crate::records::EntityKind;

/// Escape text for use in element content and quoted attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap page content in the shared layout
pub fn layout(title: &str, flash: Option<&Flash>, content: &str) -> String {
    let nav: String = EntityKind::ALL
        .iter()
        .map(|kind| {
            format!(
                r#"<a href="/{}">{}</a>"#,
                kind.slug(),
                escape_html(kind.label())
            )
        })
        .collect();

    let flash_html = flash
        .map(|f| {
            format!(
                r#"<div class="flash {}">{}</div>"#,
                f.level.css_class(),
                escape_html(&f.message)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - RecordKeeper</title>
    <link rel="stylesheet" href="/static/recordkeeper.css">
</head>
<body>
    <header>
        <h1><a href="/" style="color: inherit; text-decoration: none;">RecordKeeper</a></h1>
        <nav>{nav}<a href="/chatbot">Chatbot</a></nav>
    </header>
    <main>
        {flash_html}
        {content}
    </main>
    <footer>v{version} [{git_hash}] {profile} build {timestamp}</footer>
</body>
</html>
"#,
        title = escape_html(title),
        nav = nav,
        flash_html = flash_html,
        content = content,
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        profile = env!("BUILD_PROFILE"),
        timestamp = env!("BUILD_TIMESTAMP"),
    )
}

/// Capitalize a column name for a table header or form label
pub fn column_label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
