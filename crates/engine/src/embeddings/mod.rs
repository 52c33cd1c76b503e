//! Embedding provider trait and factory.

pub mod ollama;
pub mod openai;
pub mod trigram;

use kindred_core::{AppError, AppResult};
use std::sync::Arc;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use trigram::TrigramEmbedder;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Provider("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    provider: &str,
    model: &str,
    dimensions: usize,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider {
        "trigram" => Ok(Arc::new(TrigramEmbedder::new(dimensions))),

        "ollama" => Ok(Arc::new(OllamaEmbedder::new(model, dimensions)?)),

        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI embedding provider requires an API key".to_string())
            })?;
            Ok(Arc::new(OpenAiEmbedder::new(model, dimensions, api_key)?))
        }

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama, openai",
            other
        ))),
    }
}
