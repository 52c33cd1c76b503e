//! Profile service: insertion, lookup, and similarity retrieval.

use crate::embeddings::EmbeddingProvider;
use crate::narrative::NarrativeSynthesizer;
use crate::profile::{MatchCandidate, Profile, ProfileInput};
use chrono::Utc;
use kindred_core::{AppError, AppResult};
use kindred_index::{migrate_metadata, Filter, ProfileMetadata, ProfileRecord, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Sentinels for display projections of incomplete records.
const UNKNOWN_NAME: &str = "Unknown";
const MISSING_NARRATIVE: &str = "N/A";

/// Round a similarity score to 4 decimal places for display.
pub(crate) fn round_score(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}

/// High-level profile operations over the index, embedder, and
/// synthesizer handles. Handles are shared, never rebuilt per call.
pub struct ProfileService {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: Arc<NarrativeSynthesizer>,
}

impl ProfileService {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        synthesizer: Arc<NarrativeSynthesizer>,
    ) -> Self {
        Self {
            index,
            embedder,
            synthesizer,
        }
    }

    /// Create and index a profile from onboarding input.
    ///
    /// Synthesizes the narrative once, embeds it, and writes a single
    /// complete record. Nothing is written if any step fails.
    pub async fn insert_profile(
        &self,
        input: ProfileInput,
        owner_id: &str,
    ) -> AppResult<Profile> {
        input.validate()?;
        if owner_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Owner id must not be empty".to_string(),
            ));
        }

        let narrative = self.synthesizer.synthesize_narrative(&input.insights).await?;
        let embedding = self.embedder.embed(&narrative).await?;
        if embedding.len() != self.index.dimensions() {
            return Err(AppError::DimensionMismatch {
                expected: self.index.dimensions(),
                actual: embedding.len(),
            });
        }

        let record = ProfileRecord {
            id: Uuid::new_v4().to_string(),
            embedding,
            metadata: ProfileMetadata {
                owner_id: owner_id.to_string(),
                name: input.name,
                gender: input.gender,
                location: input.location,
                age: input.age,
                insights: input.insights,
                narrative,
                match_id: String::new(),
                created_at: Utc::now(),
            },
        };

        self.index.upsert(std::slice::from_ref(&record)).await?;
        info!("Inserted profile {} for owner {}", record.id, owner_id);

        Ok(Profile {
            id: record.id,
            metadata: record.metadata,
        })
    }

    /// Import a raw index record, canonical or legacy bio-only shape.
    ///
    /// The stored narrative is re-embedded with the current provider,
    /// so records exported from a deployment with a different embedding
    /// model import cleanly. Metadata fields (including `match_id` and
    /// `created_at`) pass through unchanged; a fresh record id is
    /// assigned.
    pub async fn import_profile(&self, raw: serde_json::Value) -> AppResult<Profile> {
        let metadata = migrate_metadata(raw)?;
        if metadata.narrative.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Imported record has no narrative to embed".to_string(),
            ));
        }

        let embedding = self.embedder.embed(&metadata.narrative).await?;
        if embedding.len() != self.index.dimensions() {
            return Err(AppError::DimensionMismatch {
                expected: self.index.dimensions(),
                actual: embedding.len(),
            });
        }

        let record = ProfileRecord {
            id: Uuid::new_v4().to_string(),
            embedding,
            metadata,
        };

        self.index.upsert(std::slice::from_ref(&record)).await?;
        info!("Imported profile {} ({})", record.id, record.metadata.name);

        Ok(Profile {
            id: record.id,
            metadata: record.metadata,
        })
    }

    /// Look up the profile owned by `owner_id`.
    pub async fn get_profile_by_owner(&self, owner_id: &str) -> AppResult<Profile> {
        // Metadata-only degenerate query: zero vector, filter on owner
        let zero = vec![0.0; self.index.dimensions()];
        let matches = self
            .index
            .query(&zero, 1, &Filter::new().eq("owner_id", owner_id), true)
            .await?;

        let found = matches.into_iter().next().ok_or_else(|| {
            AppError::NotFound(format!("No profile found for owner '{}'", owner_id))
        })?;
        let metadata = found.metadata.ok_or_else(|| {
            AppError::Index("Owner lookup returned a record without metadata".to_string())
        })?;

        Ok(Profile {
            id: found.id,
            metadata,
        })
    }

    /// Find the profiles most similar to `target_id`.
    ///
    /// Only the profile's owner may run this query. An unknown target
    /// id or a target without an embedding yields an empty result, not
    /// an error.
    pub async fn find_similar(
        &self,
        target_id: &str,
        caller_owner_id: &str,
        top_k: usize,
    ) -> AppResult<Vec<MatchCandidate>> {
        let records = self.index.fetch_by_ids(&[target_id.to_string()]).await?;
        let Some(target) = records.get(target_id) else {
            debug!("find_similar: target '{}' not in index", target_id);
            return Ok(vec![]);
        };
        if target.embedding.is_empty() {
            return Ok(vec![]);
        }

        if target.metadata.owner_id != caller_owner_id {
            return Err(AppError::Forbidden(format!(
                "Profile '{}' does not belong to owner '{}'",
                target_id, caller_owner_id
            )));
        }

        // Overfetch by one so the target's own record can be dropped
        let matches = self
            .index
            .query(&target.embedding, top_k + 1, &Filter::new(), true)
            .await?;

        let candidates: Vec<MatchCandidate> = matches
            .into_iter()
            .filter(|m| m.id != target_id)
            .take(top_k)
            .map(|m| {
                let (name, narrative) = match m.metadata {
                    Some(meta) => {
                        let name = if meta.name.is_empty() {
                            UNKNOWN_NAME.to_string()
                        } else {
                            meta.name
                        };
                        let narrative = if meta.narrative.is_empty() {
                            MISSING_NARRATIVE.to_string()
                        } else {
                            meta.narrative
                        };
                        (name, narrative)
                    }
                    None => (UNKNOWN_NAME.to_string(), MISSING_NARRATIVE.to_string()),
                };
                MatchCandidate {
                    id: m.id,
                    name,
                    narrative,
                    score: round_score(m.score),
                }
            })
            .collect();

        debug!(
            "find_similar: {} candidates for target {}",
            candidates.len(),
            target_id
        );
        Ok(candidates)
    }
}
