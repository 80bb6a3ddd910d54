#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::Sender;

    use llamabot::llm::catalog::{parse_models_info, ModelCatalog};
    use llamabot::llm::models::{
        ChatOptions, ChatResponse, Message, ModelInfo, TranscriptionRequest,
    };
    use llamabot::llm::{LlmError, LlmProvider};

    // Provider stub that counts how often the listing endpoint is hit
    struct FixedProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _options: ChatOptions,
        ) -> Result<ChatResponse, LlmError> {
            Err(LlmError::InvalidResponse)
        }

        async fn chat_streaming(
            &self,
            _messages: &[Message],
            _options: ChatOptions,
            _tx: Sender<String>,
        ) -> Result<(), LlmError> {
            Err(LlmError::InvalidResponse)
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                ModelInfo {
                    id: "llama-3.3-70b-versatile".to_string(),
                    owned_by: Some("Meta".to_string()),
                    context_window: Some(32768),
                    description: None,
                },
                ModelInfo {
                    id: "whisper-large-v3".to_string(),
                    owned_by: None,
                    context_window: None,
                    description: Some("api description".to_string()),
                },
            ])
        }

        async fn transcribe(&self, _request: TranscriptionRequest) -> Result<String, LlmError> {
            Err(LlmError::InvalidResponse)
        }
    }

    fn fixed_provider() -> Arc<FixedProvider> {
        Arc::new(FixedProvider {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_catalog_merges_local_descriptions_and_caches() {
        let provider = fixed_provider();
        let mut info = HashMap::new();
        info.insert(
            "llama-3.3-70b-versatile".to_string(),
            "local notes win".to_string(),
        );

        let catalog = ModelCatalog::new(provider.clone(), info, Duration::from_secs(300));

        let entries = catalog.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "llama-3.3-70b-versatile");
        assert_eq!(entries[0].description.as_deref(), Some("local notes win"));
        assert_eq!(entries[1].description.as_deref(), Some("api description"));

        // Second listing inside the TTL is served from the cache
        catalog.list().await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_catalog_refetches_after_ttl() {
        let provider = fixed_provider();
        let catalog = ModelCatalog::new(provider.clone(), HashMap::new(), Duration::from_millis(0));

        catalog.list().await.unwrap();
        catalog.list().await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parse_models_info() {
        let text = "\
# Model notes

**llama-3.3-70b-versatile**
- Meta's 70B model.
- 128k context window.

**gemma2-9b-it**
- Google's 9B model.
";
        let info = parse_models_info(text);
        assert_eq!(info.len(), 2);
        assert_eq!(
            info["llama-3.3-70b-versatile"],
            "- Meta's 70B model.\n- 128k context window."
        );
        assert_eq!(info["gemma2-9b-it"], "- Google's 9B model.");
    }

    #[test]
    fn test_parse_models_info_model_id_lines() {
        let text = "\
**placeholder**
- Model ID: gemma2-9b-it
- The bullet above re-keys this block.
";
        let info = parse_models_info(text);
        assert_eq!(info.len(), 1);
        assert_eq!(info["gemma2-9b-it"], "- The bullet above re-keys this block.");
    }

    #[test]
    fn test_parse_models_info_empty() {
        assert!(parse_models_info("").is_empty());
    }
}
