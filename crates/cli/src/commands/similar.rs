//! Similarity lookup command handler.

use clap::Args;
use kindred_core::{config::AppConfig, AppError, AppResult};
use kindred_engine::EngineContext;

/// Find profiles similar to one of your own
#[derive(Args, Debug)]
pub struct SimilarCommand {
    /// Owner id making the request
    #[arg(long)]
    pub owner: String,

    /// Profile id to search around (must belong to the owner)
    #[arg(long)]
    pub target: String,

    /// Number of candidates to return
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SimilarCommand {
    pub async fn execute(&self, context: &EngineContext, config: &AppConfig) -> AppResult<()> {
        let top_k = self.top_k.unwrap_or(config.matching.similar_top_k);
        let candidates = context
            .service
            .find_similar(&self.target, &self.owner, top_k)
            .await?;

        if self.json {
            let json = serde_json::to_string_pretty(&candidates)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        if candidates.is_empty() {
            println!("No similar profiles found");
            return Ok(());
        }

        for (i, candidate) in candidates.iter().enumerate() {
            println!(
                "{}. {} (score {:.4}, id {})",
                i + 1,
                candidate.name,
                candidate.score,
                candidate.id
            );
            println!("   {}", candidate.narrative);
        }

        Ok(())
    }
}
