//! JSON record API
//!
//! Mounted once per entity kind under `/api/<slug>`:
//!
//! | Method | Path          | Action                      |
//! |--------|---------------|-----------------------------|
//! | GET    | `/`           | list (optional `?order=`)   |
//! | POST   | `/`           | create, 201 with the row    |
//! | GET    | `/:id`        | fetch one                   |
//! | PUT    | `/:id`        | full edit                   |
//! | DELETE | `/:id`        | delete, 204                 |
//! | POST   | `/:id/enrich` | run the enrichment workflow |

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::db::{store, DbSession};
use crate::enrichment::{self, EnrichmentReport};
use crate::records::{EntityKind, FieldInput, Record};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub order: Option<String>,
}

/// GET /api/<slug>
pub async fn list_records(
    Extension(kind): Extension<EntityKind>,
    Query(query): Query<ListQuery>,
    mut session: DbSession,
) -> ApiResult<Json<Vec<Record>>> {
    let records = store::list(&mut session, kind, query.order.as_deref()).await?;
    Ok(Json(records))
}

/// POST /api/<slug>
pub async fn create_record(
    Extension(kind): Extension<EntityKind>,
    mut session: DbSession,
    Json(body): Json<JsonValue>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let fields = kind.parse_create(&json_input(&body)?)?;
    let id = store::insert(&mut session, kind, &fields).await?;
    let record = store::get(&mut session, kind, id).await?;
    tracing::info!(kind = %kind, id, "Record created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/<slug>/:id
pub async fn get_record(
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i64>,
    mut session: DbSession,
) -> ApiResult<Json<Record>> {
    Ok(Json(store::get(&mut session, kind, id).await?))
}

/// PUT /api/<slug>/:id
pub async fn update_record(
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i64>,
    mut session: DbSession,
    Json(body): Json<JsonValue>,
) -> ApiResult<Json<Record>> {
    let fields = kind.parse_update(&json_input(&body)?)?;
    store::update(&mut session, kind, id, &fields).await?;
    let record = store::get(&mut session, kind, id).await?;
    tracing::info!(kind = %kind, id, "Record updated");
    Ok(Json(record))
}

/// DELETE /api/<slug>/:id
pub async fn delete_record(
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i64>,
    mut session: DbSession,
) -> ApiResult<StatusCode> {
    store::delete(&mut session, kind, id).await?;
    tracing::info!(kind = %kind, id, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/<slug>/:id/enrich
pub async fn enrich_record(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<i64>,
    mut session: DbSession,
) -> ApiResult<Json<EnrichResponse>> {
    let report = enrichment::enrich(&mut session, &state.providers, kind, id).await?;
    Ok(Json(EnrichResponse::from(report)))
}

/// Body of a successful enrichment
#[derive(Debug, serde::Serialize)]
pub struct EnrichResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: EnrichmentReport,
}

impl From<EnrichmentReport> for EnrichResponse {
    fn from(report: EnrichmentReport) -> Self {
        Self {
            message: report.message(),
            report,
        }
    }
}

fn json_input(body: &JsonValue) -> ApiResult<FieldInput> {
    let object: &Map<String, JsonValue> = body
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("request body must be a JSON object".to_string()))?;
    Ok(FieldInput::from_json(object))
}

/// Build JSON routes for one kind (mounted under `/api/<slug>`)
pub fn record_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_records).post(create_record))
        .route(
            "/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/:id/enrich", post(enrich_record))
}
