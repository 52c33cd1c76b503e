//! Profile input and projection types.

use kindred_core::{AppError, AppResult};
use kindred_index::{Gender, ProfileMetadata};
use serde::{Deserialize, Serialize};

/// Onboarding input for a new profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub age: u32,
    /// Ordered onboarding answers; order matters for narrative tone
    pub insights: Vec<String>,
}

impl ProfileInput {
    /// Validate onboarding input before any provider work is done.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Profile name must not be empty".to_string(),
            ));
        }
        if self.insights.is_empty() || self.insights.iter().all(|i| i.trim().is_empty()) {
            return Err(AppError::InvalidInput(
                "Profile insights must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A fully materialized profile as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(flatten)]
    pub metadata: ProfileMetadata,
}

/// Display projection of one similarity result.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub id: String,
    pub name: String,
    pub narrative: String,
    pub score: f32,
}

/// Outcome of one matching batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    /// Profiles that initiated a successful mutual link this run
    pub matched_count: usize,
    /// Profiles examined but left unmatched this run
    pub skipped_count: usize,
}
