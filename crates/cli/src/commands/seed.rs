//! Seed command handler: bulk profile insertion from a dataset file.

use clap::Args;
use kindred_core::{AppError, AppResult};
use kindred_engine::{EngineContext, ProfileInput};
use std::path::PathBuf;

/// Bulk-insert a dataset of profiles
#[derive(Args, Debug)]
pub struct SeedCommand {
    /// Prefix for generated owner ids (owner becomes "<prefix><index>")
    #[arg(long)]
    pub owner_prefix: String,

    /// Path to a JSON file with an array of onboarding inputs
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SeedCommand {
    pub async fn execute(&self, context: &EngineContext) -> AppResult<()> {
        let contents = std::fs::read_to_string(&self.input).map_err(|e| {
            AppError::Config(format!("Failed to read input file {:?}: {}", self.input, e))
        })?;
        let inputs: Vec<ProfileInput> = serde_json::from_str(&contents).map_err(|e| {
            AppError::InvalidInput(format!("Invalid seed dataset {:?}: {}", self.input, e))
        })?;

        tracing::info!("Seeding {} profiles", inputs.len());

        let mut created = Vec::with_capacity(inputs.len());
        for (i, input) in inputs.into_iter().enumerate() {
            let owner_id = format!("{}{}", self.owner_prefix, i);
            let profile = context.service.insert_profile(input, &owner_id).await?;
            tracing::debug!("Seeded profile {} for owner {}", profile.id, owner_id);
            created.push(profile);
        }

        if self.json {
            let json = serde_json::to_string_pretty(&created)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Seeded {} profile(s)", created.len());
            for profile in &created {
                println!("  {} {} ({})", profile.id, profile.metadata.name, profile.metadata.owner_id);
            }
        }

        Ok(())
    }
}
