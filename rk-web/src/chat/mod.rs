//! Conversational endpoint
//!
//! Single-turn: one user question goes to a hosted language model and the
//! first choice's text comes back. No history is kept.

pub mod groq;

pub use groq::GroqClient;

use async_trait::async_trait;
use rk_common::config::GROQ_API_KEY_ENV;
use thiserror::Error;

/// Chat failures
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited")]
    RateLimited,

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ChatError {
    /// Text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            ChatError::EmptyQuestion => "Question is required".to_string(),
            ChatError::MissingCredential(var) if *var == GROQ_API_KEY_ENV => {
                "Groq API key is not configured. Please set GROQ_API_KEY in environment variables."
                    .to_string()
            }
            ChatError::MissingCredential(var) => format!(
                "{} is not configured. Please set {} in environment variables.",
                var, var
            ),
            _ => "Failed to get response from Groq API. Please try again.".to_string(),
        }
    }
}

/// A hosted language model
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Model identifier used for completions
    fn model(&self) -> &str;

    /// Answer one question
    async fn complete(&self, question: &str) -> Result<String, ChatError>;

    /// Model ids the service offers
    async fn list_models(&self) -> Result<Vec<String>, ChatError>;
}

/// Validate and forward a question
pub async fn ask(provider: &dyn ChatProvider, question: &str) -> Result<String, ChatError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ChatError::EmptyQuestion);
    }

    match provider.complete(question).await {
        Ok(answer) => {
            tracing::debug!(model = provider.model(), chars = answer.len(), "Chat answer received");
            Ok(answer)
        }
        Err(err) => {
            tracing::warn!(model = provider.model(), error = %err, "Chat request failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ChatProvider for Echo {
        fn model(&self) -> &str {
            "echo"
        }

        async fn complete(&self, question: &str) -> Result<String, ChatError> {
            Ok(format!("you said: {}", question))
        }

        async fn list_models(&self) -> Result<Vec<String>, ChatError> {
            Ok(vec!["echo".to_string()])
        }
    }

    #[tokio::test]
    async fn test_ask_trims_and_forwards() {
        assert_eq!(ask(&Echo, "  hello ").await.unwrap(), "you said: hello");
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_question() {
        let err = ask(&Echo, "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyQuestion));
        assert_eq!(err.user_message(), "Question is required");
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            ChatError::MissingCredential(GROQ_API_KEY_ENV).user_message(),
            "Groq API key is not configured. Please set GROQ_API_KEY in environment variables."
        );
        assert_eq!(
            ChatError::RateLimited.user_message(),
            "Failed to get response from Groq API. Please try again."
        );
    }
}
