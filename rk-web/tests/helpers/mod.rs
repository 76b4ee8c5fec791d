//! Shared fixtures for the rk-web integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use rk_web::chat::{ChatError, ChatProvider};
use rk_web::providers::{Enrichment, ProviderAdapter, ProviderError, ProviderRegistry};
use rk_web::records::{EntityKind, NaturalKey};
use rk_web::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_fake(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Adapter returning a canned answer and recording every key it was asked for
pub struct StubProvider {
    kind: EntityKind,
    answer: Box<dyn Fn(&NaturalKey) -> Result<Enrichment, ProviderError> + Send + Sync>,
    pub calls: AtomicUsize,
    pub keys: Mutex<Vec<NaturalKey>>,
}

impl StubProvider {
    pub fn new(
        kind: EntityKind,
        answer: impl Fn(&NaturalKey) -> Result<Enrichment, ProviderError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            kind,
            answer: Box::new(answer),
            calls: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn fetch(&self, key: &NaturalKey) -> Result<Enrichment, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key.clone());
        (self.answer)(key)
    }
}

/// Chat provider with no credential configured
pub struct UnconfiguredChat;

#[async_trait]
impl ChatProvider for UnconfiguredChat {
    fn model(&self) -> &str {
        "none"
    }

    async fn complete(&self, _question: &str) -> Result<String, ChatError> {
        Err(ChatError::MissingCredential("GROQ_API_KEY"))
    }

    async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        Err(ChatError::MissingCredential("GROQ_API_KEY"))
    }
}

/// Chat provider that answers with the question reversed
pub struct MirrorChat;

#[async_trait]
impl ChatProvider for MirrorChat {
    fn model(&self) -> &str {
        "mirror"
    }

    async fn complete(&self, question: &str) -> Result<String, ChatError> {
        Ok(question.chars().rev().collect())
    }

    async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        Ok(vec!["mirror".to_string()])
    }
}

/// App state over a fresh in-memory database
pub async fn test_state(providers: ProviderRegistry, chat: Arc<dyn ChatProvider>) -> AppState {
    let pool = rk_common::db::init_memory_database().await.unwrap();
    AppState::new(pool, providers, chat)
}
