//! Batch matching of unmatched profiles.
//!
//! For each unmatched profile the engine synthesizes an "ideal match"
//! description from its narrative, embeds it, and searches the index
//! for the closest unmatched profile owned by someone else. A hit
//! links both records in one write.
//!
//! Writes are conditional: the candidate is re-fetched immediately
//! before the write, and the link is abandoned if either side has been
//! matched in the meantime. Work only stops between profiles, never
//! mid-write.

use crate::embeddings::EmbeddingProvider;
use crate::narrative::NarrativeSynthesizer;
use crate::profile::MatchReport;
use kindred_core::AppResult;
use kindred_index::{Filter, ProfileRecord, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives matching batches over the shared index and providers.
pub struct MatchingEngine {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: Arc<NarrativeSynthesizer>,
    batch_size: usize,
}

impl MatchingEngine {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        synthesizer: Arc<NarrativeSynthesizer>,
        batch_size: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            synthesizer,
            batch_size,
        }
    }

    /// Run one matching batch and report the outcome.
    ///
    /// Per-profile failures are logged and counted as skipped; the
    /// batch itself never aborts wholesale.
    pub async fn run_batch(&self) -> AppResult<MatchReport> {
        let zero = vec![0.0; self.index.dimensions()];
        let unmatched = self
            .index
            .query(
                &zero,
                self.batch_size,
                &Filter::new().eq("match_id", ""),
                true,
            )
            .await?;

        if unmatched.is_empty() {
            info!("All profiles are matched; nothing to do");
            return Ok(MatchReport::default());
        }

        debug!("Matching batch of {} unmatched profiles", unmatched.len());

        let mut report = MatchReport::default();
        for seeker in &unmatched {
            match self.match_one(&seeker.id).await {
                Ok(true) => report.matched_count += 1,
                Ok(false) => report.skipped_count += 1,
                Err(e) => {
                    warn!("Matching failed for profile {}: {}", seeker.id, e);
                    report.skipped_count += 1;
                }
            }
        }

        info!(
            "Matching batch done: {} matched, {} skipped",
            report.matched_count, report.skipped_count
        );
        Ok(report)
    }

    /// Attempt to link one profile. Returns `Ok(true)` when a mutual
    /// link was written, `Ok(false)` when the profile was skipped.
    async fn match_one(&self, seeker_id: &str) -> AppResult<bool> {
        // Re-fetch: an earlier iteration may have matched this profile
        // as someone else's candidate.
        let Some(seeker) = self.fetch_one(seeker_id).await? else {
            debug!("Profile {} vanished from the index; skipping", seeker_id);
            return Ok(false);
        };
        if seeker.metadata.is_matched() {
            debug!("Profile {} already matched this run; skipping", seeker_id);
            return Ok(false);
        }

        let ideal = self
            .synthesizer
            .synthesize_ideal_match(&seeker.metadata.narrative)
            .await?;
        let query_vector = self.embedder.embed(&ideal).await?;

        // Self-exclusion is by owner: a user must never match their own
        // profile even if it was re-indexed under a new id.
        let candidates = self
            .index
            .query(
                &query_vector,
                1,
                &Filter::new()
                    .eq("match_id", "")
                    .ne("owner_id", &*seeker.metadata.owner_id),
                false,
            )
            .await?;

        let Some(chosen) = candidates.into_iter().next() else {
            debug!("No unmatched candidate for profile {}", seeker_id);
            return Ok(false);
        };

        // Optimistic re-check before the two-sided write
        let Some(mut candidate) = self.fetch_one(&chosen.id).await? else {
            debug!("Candidate {} vanished before linking; skipping", chosen.id);
            return Ok(false);
        };
        if candidate.metadata.is_matched() {
            debug!(
                "Candidate {} was matched concurrently; skipping {}",
                candidate.id, seeker_id
            );
            return Ok(false);
        }

        let mut seeker = seeker;
        seeker.metadata.match_id = candidate.id.clone();
        candidate.metadata.match_id = seeker.id.clone();

        self.index.upsert(&[seeker.clone(), candidate.clone()]).await?;
        info!("Linked profiles {} <-> {}", seeker.id, candidate.id);
        Ok(true)
    }

    async fn fetch_one(&self, id: &str) -> AppResult<Option<ProfileRecord>> {
        let mut records = self.index.fetch_by_ids(&[id.to_string()]).await?;
        Ok(records.remove(id))
    }
}
