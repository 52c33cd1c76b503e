//! In-memory vector index backend.
//!
//! A HashMap plus a full cosine scan: the reference backend for tests and
//! small local deployments. Semantics (ordering, filtering, degenerate
//! metadata queries) are identical to the persistent backend.

use crate::filter::Filter;
use crate::types::{ProfileRecord, QueryMatch};
use crate::vector_index::{cosine_similarity, is_zero_vector, VectorIndex};
use kindred_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector index.
pub struct MemoryIndex {
    dimensions: usize,
    records: RwLock<HashMap<String, ProfileRecord>>,
}

impl MemoryIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.read_records().len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A panicking writer can poison the lock; the map itself is never
    /// left half-updated (upserts insert whole records), so recover the
    /// guard instead of propagating the panic.
    fn read_records(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ProfileRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_records(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ProfileRecord>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_dimension(&self, len: usize) -> AppResult<()> {
        if len != self.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual: len,
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VectorIndex for MemoryIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn upsert(&self, records: &[ProfileRecord]) -> AppResult<()> {
        // Validate the whole batch before touching the map
        for record in records {
            self.check_dimension(record.embedding.len())?;
        }

        let mut map = self.write_records();
        for record in records {
            map.insert(record.id.clone(), record.clone());
        }

        tracing::debug!("Upserted {} records into memory index", records.len());
        Ok(())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> AppResult<HashMap<String, ProfileRecord>> {
        let map = self.read_records();
        Ok(ids
            .iter()
            .filter_map(|id| map.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &Filter,
        include_metadata: bool,
    ) -> AppResult<Vec<QueryMatch>> {
        self.check_dimension(vector.len())?;

        let map = self.read_records();
        let mut matches: Vec<QueryMatch> = map
            .values()
            .filter(|record| filter.matches(&record.id, &record.metadata))
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: if is_zero_vector(vector) {
                    0.0
                } else {
                    cosine_similarity(vector, &record.embedding)
                },
                metadata: include_metadata.then(|| record.metadata.clone()),
            })
            .collect();

        if is_zero_vector(vector) {
            // Metadata-only mode has no meaningful score ordering
            matches.sort_by(|a, b| a.id.cmp(&b.id));
        } else {
            matches.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        matches.truncate(top_k);

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gender, ProfileMetadata};
    use chrono::{TimeZone, Utc};

    fn record(id: &str, owner: &str, match_id: &str, embedding: Vec<f32>) -> ProfileRecord {
        ProfileRecord {
            id: id.to_string(),
            embedding,
            metadata: ProfileMetadata {
                owner_id: owner.to_string(),
                name: format!("User {}", id),
                gender: Gender::PreferNotToSay,
                location: "Milan".to_string(),
                age: 28,
                insights: vec!["Loves hiking".to_string()],
                narrative: "An open-minded wanderer.".to_string(),
                match_id: match_id.to_string(),
                created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_fetch_round_trip() {
        let index = MemoryIndex::new(3);
        let r = record("p1", "o1", "", vec![1.0, 0.0, 0.0]);

        index.upsert(std::slice::from_ref(&r)).await.unwrap();

        let fetched = index.fetch_by_ids(&["p1".to_string()]).await.unwrap();
        assert_eq!(fetched.get("p1"), Some(&r));
    }

    #[tokio::test]
    async fn test_fetch_missing_ids_absent() {
        let index = MemoryIndex::new(3);
        index
            .upsert(&[record("p1", "o1", "", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        let fetched = index
            .fetch_by_ids(&["p1".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert!(fetched.contains_key("p1"));
        assert!(!fetched.contains_key("ghost"));
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let index = MemoryIndex::new(3);
        let mut r = record("p1", "o1", "", vec![1.0, 0.0, 0.0]);
        index.upsert(std::slice::from_ref(&r)).await.unwrap();

        r.metadata.match_id = "p2".to_string();
        r.embedding = vec![0.0, 1.0, 0.0];
        index.upsert(std::slice::from_ref(&r)).await.unwrap();

        let fetched = index.fetch_by_ids(&["p1".to_string()]).await.unwrap();
        assert_eq!(fetched["p1"].metadata.match_id, "p2");
        assert_eq!(fetched["p1"].embedding, vec![0.0, 1.0, 0.0]);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_dimension_mismatch() {
        let index = MemoryIndex::new(3);
        let err = index
            .upsert(&[record("p1", "o1", "", vec![1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_query_orders_by_score_and_respects_top_k() {
        let index = MemoryIndex::new(2);
        index
            .upsert(&[
                record("a", "o1", "", vec![1.0, 0.0]),
                record("b", "o2", "", vec![0.8, 0.2]),
                record("c", "o3", "", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let matches = index
            .query(&[1.0, 0.0], 2, &Filter::new(), false)
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[1].id, "b");
        assert!(matches[0].score >= matches[1].score);
        assert!(matches[0].metadata.is_none());
    }

    #[tokio::test]
    async fn test_query_empty_result_is_ok() {
        let index = MemoryIndex::new(2);
        index
            .upsert(&[record("a", "o1", "taken", vec![1.0, 0.0])])
            .await
            .unwrap();

        let matches = index
            .query(&[1.0, 0.0], 5, &Filter::new().eq("match_id", ""), true)
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_only_query_with_zero_vector() {
        let index = MemoryIndex::new(2);
        index
            .upsert(&[
                record("a", "o1", "", vec![1.0, 0.0]),
                record("b", "o2", "", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let matches = index
            .query(&[0.0, 0.0], 1, &Filter::new().eq("owner_id", "o2"), true)
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "b");
        assert_eq!(matches[0].score, 0.0);
        assert_eq!(matches[0].metadata.as_ref().unwrap().owner_id, "o2");
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let index = MemoryIndex::new(2);
        let err = index
            .query(&[1.0, 0.0, 0.0], 1, &Filter::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_poisoned_lock_recovers() {
        let index = std::sync::Arc::new(MemoryIndex::new(3));

        let poisoner = index.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.records.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        // Reads and writes still work after the panic above
        index
            .upsert(&[record("p1", "o1", "", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_self_exclusion_by_owner_filter() {
        let index = MemoryIndex::new(2);
        index
            .upsert(&[
                record("a", "o1", "", vec![1.0, 0.0]),
                record("b", "o2", "", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let matches = index
            .query(
                &[1.0, 0.0],
                1,
                &Filter::new().eq("match_id", "").ne("owner_id", "o1"),
                false,
            )
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "b");
    }
}
