use serde::{Deserialize, Serialize};

use crate::db::models::ChatMessage;
use crate::sqlrun::SqlBlockOutcome;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub content: String,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub is_positive: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionQuery {
    pub filename: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub message: ChatMessage,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sql_results: Vec<SqlBlockOutcome>,
}
