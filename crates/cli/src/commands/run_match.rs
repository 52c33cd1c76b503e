//! Matching batch command handler.

use clap::Args;
use kindred_core::{AppError, AppResult};
use kindred_engine::{EngineContext, MatchingEngine};
use std::sync::Arc;

/// Run one matching batch over unmatched profiles
#[derive(Args, Debug)]
pub struct MatchCommand {
    /// Unmatched profiles to pull this run (default from config)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl MatchCommand {
    pub async fn execute(&self, context: &EngineContext) -> AppResult<()> {
        let report = match self.batch_size {
            // Rebuild the engine only when the batch size is overridden;
            // the underlying handles are shared either way.
            Some(batch_size) => {
                let engine = MatchingEngine::new(
                    Arc::clone(&context.index),
                    Arc::clone(&context.embedder),
                    Arc::clone(&context.synthesizer),
                    batch_size,
                );
                engine.run_batch().await?
            }
            None => context.matching.run_batch().await?,
        };

        if self.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!(
                "Matched {} profile(s), skipped {}",
                report.matched_count, report.skipped_count
            );
        }

        Ok(())
    }
}
