//! JSON chat endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::chat;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub question: String,
    pub response: String,
}

/// POST /api/chat
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let response = chat::ask(state.chat.as_ref(), &request.question).await?;
    Ok(Json(ChatResponse {
        question: request.question.trim().to_string(),
        response,
    }))
}

/// Build chat API routes
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/api/chat", post(ask))
}
