//! Scripted mock client for tests and offline development.

use crate::client::{GenerationRequest, GenerationResponse, LlmClient, Usage};
use kindred_core::{AppError, AppResult};

/// Mock provider that derives a deterministic completion from the prompt.
///
/// Not a language model: it produces a stable transformation of the input
/// so pipelines that expect "some generated text distinct from the prompt"
/// can be exercised without a running provider.
#[derive(Debug, Default)]
pub struct MockClient;

impl MockClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        if request.prompt.trim().is_empty() {
            return Err(AppError::Provider(
                "Mock client cannot complete an empty prompt".to_string(),
            ));
        }

        // Stable, content-dependent output that never echoes the prompt
        // verbatim from the start.
        let excerpt: String = request.prompt.chars().take(240).collect();
        let content = format!("A synthesized sketch: {}", excerpt.trim());

        Ok(GenerationResponse {
            content,
            model: request.model.clone(),
            usage: Usage::new(request.prompt.len() as u32 / 4, 32),
        })
    }
}
