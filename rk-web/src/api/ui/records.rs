//! Record pages, mounted once per entity kind
//!
//! GET pages render directly. Every POST does its work, stores the outcome
//! in the flash cookie and redirects back to the list (or to the edit form
//! when the edit input was rejected).

use axum::{
    extract::{Path, State},
    response::Response,
    Extension, Form,
};
use std::collections::HashMap;
use tracing::{info, warn};

use super::flash::{Flash, IncomingFlash};
use super::html::{column_label, escape_html, layout};
use super::session::{PageSession, STORE_DOWN_MESSAGE};
use crate::db::store;
use crate::enrichment;
use crate::records::{ColumnType, EntityKind, FieldInput, Record};
use crate::AppState;

/// Columns shown in the list table
fn list_columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Movie => &["title", "year", "director", "genre"],
        EntityKind::Ticker => &["symbol", "name", "price"],
        EntityKind::Weather => &["city", "state", "temperature"],
    }
}

/// Fields of the inline add form
fn add_columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Movie => &["title"],
        EntityKind::Ticker => &["symbol", "name", "price"],
        EntityKind::Weather => &["city", "state"],
    }
}

fn list_url(kind: EntityKind) -> String {
    format!("/{}", kind.slug())
}

/// Flash text for a failed store call
fn store_error_message(kind: EntityKind, err: &rk_common::Error) -> String {
    match err {
        rk_common::Error::InvalidInput(message) => message.clone(),
        rk_common::Error::NotFound(_) => kind.not_found_message().to_string(),
        rk_common::Error::StoreUnavailable(_) => STORE_DOWN_MESSAGE.to_string(),
        other => format!("Database error: {}", other),
    }
}

fn input_type(kind: EntityKind, column: &str) -> &'static str {
    match kind.descriptor().column(column).map(|c| c.column_type) {
        Some(ColumnType::Integer) | Some(ColumnType::Real) => "number",
        _ => "text",
    }
}

fn field_value(fields: &[(&'static str, String)], column: &str) -> String {
    fields
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

fn action_buttons(record: &Record) -> String {
    let base = format!("/{}/{}", record.kind().slug(), record.id());
    format!(
        r#"<a class="button secondary" href="{base}">View</a>
        <a class="button secondary" href="{base}/edit">Edit</a>
        <form method="post" action="{base}/enrich"><button type="submit">{enrich}</button></form>
        <form method="post" action="{base}/delete" onsubmit="return confirm('Delete {name}?');"><button type="submit" class="danger">Delete</button></form>"#,
        base = base,
        enrich = escape_html(record.kind().enrich_label()),
        name = escape_html(&record.display_name().replace('\'', "")),
    )
}

/// GET /<slug>
pub async fn list_page(
    Extension(kind): Extension<EntityKind>,
    flash: IncomingFlash,
    mut session: PageSession,
) -> Response {
    let columns = list_columns(kind);

    let (rows, load_error) = match store::list(&mut session, kind, None).await {
        Ok(records) => (records, None),
        Err(err) => {
            warn!(kind = %kind, error = %err, "List failed");
            (Vec::new(), Some(Flash::error(store_error_message(kind, &err))))
        }
    };

    let header: String = columns
        .iter()
        .map(|c| format!("<th>{}</th>", column_label(c)))
        .collect();

    let body: String = if rows.is_empty() {
        format!(
            r#"<tr><td colspan="{}">No records yet.</td></tr>"#,
            columns.len() + 1
        )
    } else {
        rows.iter()
            .map(|record| {
                let fields = record.display_fields();
                let cells: String = columns
                    .iter()
                    .map(|c| format!("<td>{}</td>", escape_html(&field_value(&fields, c))))
                    .collect();
                format!(
                    r#"<tr>{cells}<td class="actions">{actions}</td></tr>"#,
                    cells = cells,
                    actions = action_buttons(record)
                )
            })
            .collect()
    };

    let add_inputs: String = add_columns(kind)
        .iter()
        .map(|c| {
            let step = if input_type(kind, c) == "number" { r#" step="any""# } else { "" };
            format!(
                r#"<input type="{ty}"{step} name="{name}" placeholder="{label}">"#,
                ty = input_type(kind, c),
                step = step,
                name = c,
                label = column_label(c),
            )
        })
        .collect();

    let content = format!(
        r#"<h2>{label}</h2>
        <form class="inline-add" method="post" action="/{slug}/add">
            {add_inputs}
            <button type="submit">Add</button>
        </form>
        <table>
            <thead><tr>{header}<th>Actions</th></tr></thead>
            <tbody>{body}</tbody>
        </table>"#,
        label = escape_html(kind.label()),
        slug = kind.slug(),
        add_inputs = add_inputs,
        header = header,
        body = body,
    );

    // A load failure takes precedence over a flash carried from the last post
    let shown = load_error.as_ref().or(flash.current());
    flash.render(layout(kind.label(), shown, &content))
}

/// GET /<slug>/:id
pub async fn detail_page(
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i64>,
    flash: IncomingFlash,
    mut session: PageSession,
) -> Response {
    let record = match store::get(&mut session, kind, id).await {
        Ok(record) => record,
        Err(err) => return Flash::error(store_error_message(kind, &err)).redirect(&list_url(kind)),
    };

    let mut rows = String::new();
    for (name, value) in record.display_fields() {
        let rendered = if name == "poster" && is_http_url(&value) {
            format!(
                r#"<img class="poster" src="{src}" alt="Poster">"#,
                src = escape_html(&value)
            )
        } else {
            escape_html(&value)
        };
        rows.push_str(&format!(
            "<dt>{}</dt><dd>{}</dd>",
            column_label(name),
            rendered
        ));
    }
    rows.push_str(&format!(
        "<dt>Created</dt><dd>{}</dd><dt>Updated</dt><dd>{}</dd>",
        record.created_at().format("%Y-%m-%d %H:%M:%S"),
        record.updated_at().format("%Y-%m-%d %H:%M:%S"),
    ));

    let content = format!(
        r#"<h2>{name}</h2>
        <dl class="detail">{rows}</dl>
        <div class="actions">{actions}</div>
        <p><a href="/{slug}">Back to {label}</a></p>"#,
        name = escape_html(&record.display_name()),
        rows = rows,
        actions = action_buttons(&record),
        slug = kind.slug(),
        label = escape_html(kind.label()),
    );

    flash.render(layout(&record.display_name(), flash.current(), &content))
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// GET /<slug>/:id/edit
pub async fn edit_page(
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i64>,
    flash: IncomingFlash,
    mut session: PageSession,
) -> Response {
    let record = match store::get(&mut session, kind, id).await {
        Ok(record) => record,
        Err(err) => return Flash::error(store_error_message(kind, &err)).redirect(&list_url(kind)),
    };

    let fields = record.form_values();
    let inputs: String = kind
        .descriptor()
        .columns
        .iter()
        .map(|spec| {
            let value = escape_html(&field_value(&fields, spec.name));
            let control = if spec.name == "plot" {
                format!(r#"<textarea name="plot" rows="5">{}</textarea>"#, value)
            } else {
                let ty = input_type(kind, spec.name);
                let step = if ty == "number" { r#" step="any""# } else { "" };
                let required = if spec.required { " required" } else { "" };
                format!(
                    r#"<input type="{ty}"{step} name="{name}" value="{value}"{required}>"#,
                    ty = ty,
                    step = step,
                    name = spec.name,
                    value = value,
                    required = required,
                )
            };
            format!(
                "<label>{}{}</label>",
                column_label(spec.name),
                control
            )
        })
        .collect();

    let content = format!(
        r#"<h2>Edit {name}</h2>
        <form class="edit" method="post" action="/{slug}/{id}/edit">
            {inputs}
            <button type="submit">Save</button>
            <a class="button secondary" href="/{slug}">Cancel</a>
        </form>"#,
        name = escape_html(&record.display_name()),
        slug = kind.slug(),
        id = id,
        inputs = inputs,
    );

    flash.render(layout("Edit", flash.current(), &content))
}

/// POST /<slug>/add
pub async fn add_record(
    Extension(kind): Extension<EntityKind>,
    mut session: PageSession,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let list = list_url(kind);
    let fields = match kind.parse_create(&FieldInput::from_form(form)) {
        Ok(fields) => fields,
        Err(err) => return Flash::error(store_error_message(kind, &err)).redirect(&list),
    };

    let added = async {
        let id = store::insert(&mut session, kind, &fields).await?;
        let record = store::get(&mut session, kind, id).await?;
        Ok::<_, rk_common::Error>(record)
    }
    .await;

    match added {
        Ok(record) => {
            info!(kind = %kind, id = record.id(), "Record added");
            Flash::success(record.added_message()).redirect(&list)
        }
        Err(err) => Flash::error(store_error_message(kind, &err)).redirect(&list),
    }
}

/// POST /<slug>/:id/edit
pub async fn edit_record(
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i64>,
    mut session: PageSession,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let fields = match kind.parse_update(&FieldInput::from_form(form)) {
        Ok(fields) => fields,
        Err(err) => {
            return Flash::error(store_error_message(kind, &err))
                .redirect(&format!("/{}/{}/edit", kind.slug(), id))
        }
    };

    let updated = async {
        store::update(&mut session, kind, id, &fields).await?;
        let record = store::get(&mut session, kind, id).await?;
        Ok::<_, rk_common::Error>(record)
    }
    .await;

    match updated {
        Ok(record) => {
            info!(kind = %kind, id, "Record updated");
            Flash::success(record.updated_message()).redirect(&list_url(kind))
        }
        Err(err) => Flash::error(store_error_message(kind, &err)).redirect(&list_url(kind)),
    }
}

/// POST /<slug>/:id/enrich
pub async fn enrich_record(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i64>,
    mut session: PageSession,
) -> Response {
    let flash = match enrichment::enrich(&mut session, &state.providers, kind, id).await {
        Ok(report) => Flash::success(report.message()),
        Err(err) => Flash::error(err.user_message()),
    };
    flash.redirect(&list_url(kind))
}

/// POST /<slug>/:id/delete
pub async fn delete_record(
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i64>,
    mut session: PageSession,
) -> Response {
    let deleted = async {
        let record = store::get(&mut session, kind, id).await?;
        store::delete(&mut session, kind, id).await?;
        Ok::<_, rk_common::Error>(record)
    }
    .await;

    let flash = match deleted {
        Ok(record) => {
            info!(kind = %kind, id, "Record deleted");
            Flash::success(record.deleted_message())
        }
        Err(err) => Flash::error(store_error_message(kind, &err)),
    };
    flash.redirect(&list_url(kind))
}
