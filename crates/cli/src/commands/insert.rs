//! Insert command handler.

use clap::Args;
use kindred_core::{AppError, AppResult};
use kindred_engine::{EngineContext, Profile, ProfileInput};
use std::path::PathBuf;

/// Create a profile from an onboarding input file
#[derive(Args, Debug)]
pub struct InsertCommand {
    /// Owner id the profile belongs to
    #[arg(long)]
    pub owner: String,

    /// Path to a JSON file with the onboarding input
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InsertCommand {
    pub async fn execute(&self, context: &EngineContext) -> AppResult<()> {
        tracing::info!("Inserting profile for owner {}", self.owner);

        let input = read_input(&self.input)?;
        let profile = context.service.insert_profile(input, &self.owner).await?;

        if self.json {
            print_profile_json(&profile)?;
        } else {
            println!("Created profile {}", profile.id);
            println!("  name:      {}", profile.metadata.name);
            println!("  narrative: {}", profile.metadata.narrative);
        }

        Ok(())
    }
}

pub(crate) fn read_input(path: &PathBuf) -> AppResult<ProfileInput> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read input file {:?}: {}", path, e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| AppError::InvalidInput(format!("Invalid profile input {:?}: {}", path, e)))
}

pub(crate) fn print_profile_json(profile: &Profile) -> AppResult<()> {
    let json = serde_json::to_string_pretty(profile)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
