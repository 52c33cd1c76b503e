//! Migration of legacy index records to the current metadata shape.
//!
//! Early deployments stored only a name and a free-form bio. Those
//! records are upgraded on read: the bio becomes the narrative and the
//! missing structured fields take their defaults.

use crate::types::{Gender, ProfileMetadata};
use chrono::{DateTime, Utc};
use kindred_core::{AppError, AppResult};
use serde::Deserialize;

#[derive(Deserialize)]
struct LegacyMetadata {
    name: String,
    bio: String,
    #[serde(rename = "ownerId", default)]
    owner_id: String,
}

/// Decode raw metadata into the current [`ProfileMetadata`] shape.
///
/// Canonical records pass through unchanged. Legacy `{name, bio}`
/// records are upgraded with default structured fields and an empty
/// `match_id` (so they remain eligible for matching). Anything else
/// is rejected as invalid input.
pub fn migrate_metadata(value: serde_json::Value) -> AppResult<ProfileMetadata> {
    if let Ok(metadata) = serde_json::from_value::<ProfileMetadata>(value.clone()) {
        return Ok(metadata);
    }

    let legacy: LegacyMetadata = serde_json::from_value(value).map_err(|e| {
        AppError::InvalidInput(format!("Unrecognized profile metadata shape: {}", e))
    })?;

    tracing::debug!("Upgrading legacy bio-only record for '{}'", legacy.name);

    Ok(ProfileMetadata {
        owner_id: legacy.owner_id,
        name: legacy.name,
        gender: Gender::default(),
        location: String::new(),
        age: 0,
        insights: Vec::new(),
        narrative: legacy.bio,
        match_id: String::new(),
        created_at: DateTime::<Utc>::UNIX_EPOCH,
    })
}
