//! Narrative synthesis from onboarding insights.
//!
//! Two single-shot generations: a third-person personality narrative
//! from the user's ordered onboarding answers, and a description of
//! the personality that would best complement that narrative. Both
//! run at temperature 0.8; variance between runs is intentional.

use kindred_core::{AppError, AppResult};
use kindred_llm::{GenerationRequest, LlmClient};
use std::sync::Arc;
use tracing::debug;

const NARRATIVE_SYSTEM_PROMPT: &str = "\
You are a personality analyst trained to interpret narrative onboarding responses for a friend-matching app.

I will give you a list of questions and a user's responses. Your task is to write a short, warm and insightful description of this person in the third person, focusing on how they might connect with others.

Don't repeat the questions. Instead, infer values, social tendencies, and emotional tone from their answers. Describe the kind of friend they are or might be.

Keep the tone friendly, human, and suitable for social matching.";

const IDEAL_MATCH_SYSTEM_PROMPT: &str = "\
You are a relationship advisor trained on matching users based on personality narratives.

I will give you a user's narrative. Your task is to infer what kind of personality would be the most compatible match for this person, for a friendship, not romance.

Respond with a short description of the ideal match's personality, in the third person. Focus on qualities that would complement or resonate with the user's values, energy, and social tendencies.

This response will be embedded for semantic matching, so keep it concise, expressive, and reflective of a real person's vibe.";

const GENERATION_TEMPERATURE: f32 = 0.8;

/// Synthesizes personality narratives through an LLM client.
pub struct NarrativeSynthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl NarrativeSynthesizer {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Generate a third-person personality narrative from ordered
    /// onboarding insights.
    pub async fn synthesize_narrative(&self, insights: &[String]) -> AppResult<String> {
        if insights.is_empty() || insights.iter().all(|i| i.trim().is_empty()) {
            return Err(AppError::InvalidInput(
                "Cannot synthesize a narrative from empty insights".to_string(),
            ));
        }

        let joined = insights
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Here's the user's input:\n{}\n\nWhat kind of person is this? Write a short paragraph describing them.",
            joined
        );

        let content = self.generate(&prompt, NARRATIVE_SYSTEM_PROMPT).await?;
        debug!("Synthesized narrative ({} chars)", content.len());
        Ok(content)
    }

    /// Generate a description of the personality that would best
    /// complement the given narrative, phrased for embedding.
    pub async fn synthesize_ideal_match(&self, narrative: &str) -> AppResult<String> {
        if narrative.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Cannot derive an ideal match from an empty narrative".to_string(),
            ));
        }

        let prompt = format!(
            "Here's the user's input:\n{}\n\nWhat kind of personality would be their ideal friend match?",
            narrative
        );

        let content = self.generate(&prompt, IDEAL_MATCH_SYSTEM_PROMPT).await?;
        debug!("Synthesized ideal-match description ({} chars)", content.len());
        Ok(content)
    }

    async fn generate(&self, prompt: &str, system: &str) -> AppResult<String> {
        let request = GenerationRequest::new(prompt, &self.model)
            .with_system(system)
            .with_temperature(GENERATION_TEMPERATURE);

        let response = self
            .client
            .generate(&request)
            .await
            .map_err(|e| AppError::Synthesis(format!("Narrative generation failed: {}", e)))?;

        let content = response.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Synthesis(
                "Model returned an empty narrative".to_string(),
            ));
        }

        Ok(content)
    }
}
