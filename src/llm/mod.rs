pub mod catalog;
pub mod groq;
pub mod models;

use groq::GroqProvider;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::Sender;

use crate::config::AppConfig;
use models::{ChatOptions, ChatResponse, Message, ModelInfo, TranscriptionRequest};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Invalid Response")]
    InvalidResponse,
    #[error("Rate Limited")]
    RateLimited,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError>;

    async fn chat_streaming(
        &self,
        messages: &[Message],
        options: ChatOptions,
        tx: Sender<String>,
    ) -> Result<(), LlmError>;

    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError>;

    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String, LlmError>;
}

/// Builds the Groq provider from config. Returns None when no API key is set.
pub fn create_provider(config: &AppConfig) -> Option<Arc<dyn LlmProvider>> {
    if config.groq.api_key.trim().is_empty() {
        return None;
    }

    Some(Arc::new(GroqProvider::new(
        config.groq.api_key.clone(),
        config.groq.api_base.clone(),
        config.groq.default_model.clone(),
    )))
}
