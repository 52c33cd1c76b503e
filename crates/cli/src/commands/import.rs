//! Import command handler: re-index raw records, legacy shapes included.

use clap::Args;
use kindred_core::{AppError, AppResult};
use kindred_engine::EngineContext;
use std::path::PathBuf;

/// Import raw index records (canonical or legacy bio-only shape)
#[derive(Args, Debug)]
pub struct ImportCommand {
    /// Path to a JSON file with an array of raw records
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ImportCommand {
    pub async fn execute(&self, context: &EngineContext) -> AppResult<()> {
        let contents = std::fs::read_to_string(&self.input).map_err(|e| {
            AppError::Config(format!("Failed to read input file {:?}: {}", self.input, e))
        })?;
        let records: Vec<serde_json::Value> = serde_json::from_str(&contents).map_err(|e| {
            AppError::InvalidInput(format!("Invalid import file {:?}: {}", self.input, e))
        })?;

        tracing::info!("Importing {} records", records.len());

        let mut imported = Vec::with_capacity(records.len());
        for record in records {
            let profile = context.service.import_profile(record).await?;
            tracing::debug!("Imported profile {} ({})", profile.id, profile.metadata.name);
            imported.push(profile);
        }

        if self.json {
            let json = serde_json::to_string_pretty(&imported)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Imported {} profile(s)", imported.len());
            for profile in &imported {
                println!("  {} {}", profile.id, profile.metadata.name);
            }
        }

        Ok(())
    }
}
