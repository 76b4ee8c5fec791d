//! Groq chat client (OpenAI-compatible API)

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use rk_common::config::GROQ_API_KEY_ENV;
use serde::Deserialize;
use serde_json::json;

use super::{ChatError, ChatProvider};
use crate::config::{ChatSettings, USER_AGENT};

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Option<Vec<CompletionChoice>>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Option<Vec<ModelEntry>>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Client for `<base>/chat/completions` and `<base>/models`
pub struct GroqClient {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GroqClient {
    pub fn new(http_client: Client, base_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            http_client,
            base_url,
            model,
            api_key,
        }
    }

    pub fn from_settings(settings: &ChatSettings) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));

        let http_client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self::new(
            http_client,
            settings.base_url.clone(),
            settings.model.clone(),
            settings.api_key.clone(),
        ))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn api_key(&self) -> Result<&str, ChatError> {
        self.api_key
            .as_deref()
            .ok_or(ChatError::MissingCredential(GROQ_API_KEY_ENV))
    }

    /// Send a request and return the raw body of a successful response
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ChatError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Timeout(e.to_string())
            } else {
                ChatError::Http(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ChatError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(ChatError::RateLimited),
            _ => {}
        }

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(ChatError::Http(format!("{} {}", status.as_u16(), raw)));
        }
        Ok(raw)
    }
}

#[async_trait]
impl ChatProvider for GroqClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, question: &str) -> Result<String, ChatError> {
        let api_key = self.api_key()?;
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": question}
            ]
        });

        let raw = self
            .send(
                self.http_client
                    .post(self.url("chat/completions"))
                    .bearer_auth(api_key)
                    .json(&body),
            )
            .await?;

        let parsed: CompletionResponse = serde_json::from_str(&raw)
            .map_err(|e| ChatError::InvalidResponse(format!("json parse failed: {}", e)))?;

        parsed
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| ChatError::InvalidResponse("missing choices[0].message.content".to_string()))
    }

    async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let api_key = self.api_key()?;
        let raw = self
            .send(self.http_client.get(self.url("models")).bearer_auth(api_key))
            .await?;

        let parsed: ModelList = serde_json::from_str(&raw)
            .map_err(|e| ChatError::InvalidResponse(format!("json parse failed: {}", e)))?;

        let mut ids: Vec<String> = parsed
            .data
            .ok_or_else(|| ChatError::InvalidResponse("missing data".to_string()))?
            .into_iter()
            .map(|m| m.id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}
