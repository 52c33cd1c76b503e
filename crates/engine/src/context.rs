//! Engine context: long-lived handles built once from configuration.

use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::matching::MatchingEngine;
use crate::narrative::NarrativeSynthesizer;
use crate::service::ProfileService;
use kindred_core::{AppConfig, AppError, AppResult};
use kindred_index::{LanceDbIndex, MemoryIndex, VectorIndex};
use kindred_llm::create_client;
use std::sync::Arc;
use tracing::debug;

/// Shared handles for one engine process. Built once from the resolved
/// configuration and cloned cheaply (everything is behind `Arc`).
pub struct EngineContext {
    pub index: Arc<dyn VectorIndex>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub synthesizer: Arc<NarrativeSynthesizer>,
    pub service: Arc<ProfileService>,
    pub matching: Arc<MatchingEngine>,
}

impl EngineContext {
    /// Build all engine handles from a validated configuration.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let index: Arc<dyn VectorIndex> = match config.index.backend.as_str() {
            "memory" => Arc::new(MemoryIndex::new(config.embedding_dim)),
            "lancedb" => Arc::new(
                LanceDbIndex::new(&config.index.path, &config.index.table, config.embedding_dim)
                    .await?,
            ),
            other => {
                return Err(AppError::Config(format!(
                    "Unknown index backend: '{}'",
                    other
                )))
            }
        };

        let embedder = create_provider(
            &config.embedding_provider,
            &config.embedding_model,
            config.embedding_dim,
            config.api_key.as_deref(),
        )?;

        let client = create_client(&config.provider, None, config.api_key.as_deref())?;
        let synthesizer = Arc::new(NarrativeSynthesizer::new(client, &config.model));

        let service = Arc::new(ProfileService::new(
            Arc::clone(&index),
            Arc::clone(&embedder),
            Arc::clone(&synthesizer),
        ));
        let matching = Arc::new(MatchingEngine::new(
            Arc::clone(&index),
            Arc::clone(&embedder),
            Arc::clone(&synthesizer),
            config.matching.batch_size,
        ));

        debug!(
            "Engine ready: index={}, embedder={}/{} ({}d), llm={}",
            config.index.backend,
            embedder.provider_name(),
            embedder.model_name(),
            embedder.dimensions(),
            config.provider
        );

        Ok(Self {
            index,
            embedder,
            synthesizer,
            service,
            matching,
        })
    }
}
