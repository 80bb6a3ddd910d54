use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use crate::llm::{LlmError, LlmProvider};

#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    pub id: String,
    pub description: Option<String>,
}

struct CachedList {
    fetched_at: Instant,
    entries: Vec<ModelEntry>,
}

/// Model listing with local descriptions merged in, cached for a TTL so the
/// UI dropdown doesn't hit the API on every page load.
pub struct ModelCatalog {
    provider: Arc<dyn LlmProvider>,
    info: HashMap<String, String>,
    ttl: Duration,
    cached: RwLock<Option<CachedList>>,
}

impl ModelCatalog {
    pub fn new(provider: Arc<dyn LlmProvider>, info: HashMap<String, String>, ttl: Duration) -> Self {
        Self {
            provider,
            info,
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<ModelEntry>, LlmError> {
        {
            let cached = self.cached.read().await;
            if let Some(list) = cached.as_ref() {
                if list.fetched_at.elapsed() < self.ttl {
                    return Ok(list.entries.clone());
                }
            }
        }

        let models = self.provider.list_models().await?;
        let entries: Vec<ModelEntry> = models
            .into_iter()
            .map(|model| {
                // Local notes take precedence over whatever the API reports
                let description = self.info.get(&model.id).cloned().or(model.description);
                ModelEntry {
                    id: model.id,
                    description,
                }
            })
            .collect();

        let mut cached = self.cached.write().await;
        *cached = Some(CachedList {
            fetched_at: Instant::now(),
            entries: entries.clone(),
        });

        Ok(entries)
    }
}

pub fn load_models_info(path: &str) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_models_info(&text),
        Err(e) => {
            warn!("Could not read model notes from {}: {}", path, e);
            HashMap::new()
        }
    }
}

/// Parses a models_info.md file into id -> description. Headings look like
/// `**model-id**`, descriptions are the `- ` bullets below, and a
/// `- Model ID:` bullet re-keys the block it appears in.
pub fn parse_models_info(text: &str) -> HashMap<String, String> {
    let mut info = HashMap::new();
    let mut current_id: Option<String> = None;
    let mut description: Vec<String> = Vec::new();

    for line in text.lines() {
        if line.starts_with("**") {
            if let Some(id) = current_id.take() {
                info.insert(id, description.join("\n"));
            }
            current_id = line.split("**").nth(1).map(|s| s.trim().to_string());
            description.clear();
        } else if let Some(rest) = line.strip_prefix("- Model ID:") {
            current_id = Some(rest.trim().to_string());
        } else if line.starts_with("- ") {
            description.push(line.trim().to_string());
        }
    }
    if let Some(id) = current_id {
        info.insert(id, description.join("\n"));
    }

    info
}
