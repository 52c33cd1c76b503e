//! Vector index abstraction for profile records.
//!
//! Defines a trait for provider-agnostic vector storage and retrieval.

use crate::filter::Filter;
use crate::types::{ProfileRecord, QueryMatch};
use kindred_core::AppResult;
use std::collections::HashMap;

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Upserting records with full-replace semantics per id
/// - Fetching records by id (absent ids are simply missing, not errors)
/// - Similarity queries with metadata filtering (top-k, descending score)
///
/// A zero query vector selects the metadata-only degenerate mode: records
/// are matched by filter alone and scored 0.0.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embedding dimension this index was created with.
    fn dimensions(&self) -> usize;

    /// Insert or fully replace records. Safe for singleton and batch calls.
    ///
    /// Rejects any record whose embedding length differs from
    /// [`dimensions`](VectorIndex::dimensions) before writing anything.
    async fn upsert(&self, records: &[ProfileRecord]) -> AppResult<()>;

    /// Fetch records by id. Ids not present are absent from the result map.
    async fn fetch_by_ids(&self, ids: &[String]) -> AppResult<HashMap<String, ProfileRecord>>;

    /// Search for the top-k records most similar to the query vector,
    /// restricted to records matching `filter`.
    ///
    /// Returns at most `top_k` matches ordered by descending cosine
    /// similarity; an empty result is `Ok(vec![])`, never an error.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &Filter,
        include_metadata: bool,
    ) -> AppResult<Vec<QueryMatch>>;
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Whether a query vector selects the metadata-only degenerate mode.
pub(crate) fn is_zero_vector(vector: &[f32]) -> bool {
    vector.iter().all(|v| *v == 0.0)
}
