//! Profile record model persisted in the vector index.

use chrono::{DateTime, Utc};
use kindred_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Self-described gender of a profile owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    #[default]
    PreferNotToSay,
}

impl Gender {
    /// Stable string form used in the index and filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non_binary",
            Gender::PreferNotToSay => "prefer_not_to_say",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "non_binary" => Ok(Gender::NonBinary),
            "prefer_not_to_say" => Ok(Gender::PreferNotToSay),
            other => Err(AppError::InvalidInput(format!(
                "Unknown gender: '{}'",
                other
            ))),
        }
    }
}

/// Metadata stored alongside a profile's embedding.
///
/// `match_id` is the only field mutated after creation: empty while the
/// profile is unmatched, set exactly once by the matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Identity of the real-world user who owns this profile.
    /// Distinct from the record id so a profile can be re-indexed.
    pub owner_id: String,

    /// Display name
    pub name: String,

    /// Self-described gender
    #[serde(default)]
    pub gender: Gender,

    /// Free-form location
    pub location: String,

    /// Age in years
    pub age: u32,

    /// Ordered onboarding answers; order matters for narrative generation
    pub insights: Vec<String>,

    /// Third-person narrative derived once from the insights
    pub narrative: String,

    /// Id of the matched profile; empty while unmatched
    #[serde(default)]
    pub match_id: String,

    /// When the profile was first indexed
    pub created_at: DateTime<Utc>,
}

impl ProfileMetadata {
    /// Whether this profile has been assigned a match.
    pub fn is_matched(&self) -> bool {
        !self.match_id.is_empty()
    }
}

/// A profile record as persisted in the vector index:
/// id + embedding + metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Opaque unique identifier of this record
    pub id: String,

    /// Embedding of the narrative, length fixed at deployment
    pub embedding: Vec<f32>,

    /// Structured metadata
    pub metadata: ProfileMetadata,
}

/// A single similarity-query result. Transient, never persisted.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    /// Matched record id
    pub id: String,

    /// Cosine similarity; higher is more similar
    pub score: f32,

    /// Present when the query requested metadata
    pub metadata: Option<ProfileMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_round_trip() {
        for gender in [
            Gender::Male,
            Gender::Female,
            Gender::NonBinary,
            Gender::PreferNotToSay,
        ] {
            assert_eq!(Gender::parse(gender.as_str()).unwrap(), gender);
        }
    }

    #[test]
    fn test_gender_default() {
        assert_eq!(Gender::default(), Gender::PreferNotToSay);
    }

    #[test]
    fn test_gender_parse_unknown() {
        assert!(Gender::parse("other").is_err());
    }

    #[test]
    fn test_is_matched() {
        let mut metadata = ProfileMetadata {
            owner_id: "o1".to_string(),
            name: "Ada".to_string(),
            gender: Gender::default(),
            location: "Turin".to_string(),
            age: 30,
            insights: vec![],
            narrative: String::new(),
            match_id: String::new(),
            created_at: Utc::now(),
        };
        assert!(!metadata.is_matched());

        metadata.match_id = "p2".to_string();
        assert!(metadata.is_matched());
    }
}
