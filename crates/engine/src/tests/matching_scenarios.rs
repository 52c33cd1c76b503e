//! End-to-end matching scenarios over the in-memory index.

use crate::embeddings::{EmbeddingProvider, TrigramEmbedder};
use crate::matching::MatchingEngine;
use crate::narrative::NarrativeSynthesizer;
use crate::profile::ProfileInput;
use crate::service::ProfileService;
use kindred_core::AppResult;
use kindred_index::{Filter, MemoryIndex, ProfileRecord, QueryMatch, VectorIndex};
use kindred_llm::providers::mock::MockClient;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const DIM: usize = 64;

struct Harness {
    index: Arc<MemoryIndex>,
    service: ProfileService,
    engine: MatchingEngine,
}

fn harness(batch_size: usize) -> Harness {
    let index = Arc::new(MemoryIndex::new(DIM));
    let embedder = Arc::new(TrigramEmbedder::new(DIM));
    let synthesizer = Arc::new(NarrativeSynthesizer::new(
        Arc::new(MockClient::new()),
        "mock-model",
    ));

    let service = ProfileService::new(
        index.clone() as Arc<dyn VectorIndex>,
        embedder.clone() as Arc<dyn EmbeddingProvider>,
        synthesizer.clone(),
    );
    let engine = MatchingEngine::new(
        index.clone() as Arc<dyn VectorIndex>,
        embedder,
        synthesizer,
        batch_size,
    );

    Harness {
        index,
        service,
        engine,
    }
}

fn input(name: &str, insight: &str) -> ProfileInput {
    ProfileInput {
        name: name.to_string(),
        gender: Default::default(),
        location: "Lisbon".to_string(),
        age: 31,
        insights: vec![insight.to_string()],
    }
}

async fn all_records(index: &MemoryIndex) -> Vec<ProfileRecord> {
    let zero = vec![0.0; DIM];
    let matches = index.query(&zero, usize::MAX, &Filter::new(), true).await.unwrap();
    let ids: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();
    let mut map = index.fetch_by_ids(&ids).await.unwrap();
    ids.into_iter().filter_map(|id| map.remove(&id)).collect()
}

#[tokio::test]
async fn test_two_compatible_profiles_link_mutually() {
    let h = harness(5);

    let ada = h
        .service
        .insert_profile(input("Ada", "Quiet museum trips and long letters"), "o1")
        .await
        .unwrap();
    let grace = h
        .service
        .insert_profile(input("Grace", "Quiet galleries and handwritten notes"), "o2")
        .await
        .unwrap();

    let report = h.engine.run_batch().await.unwrap();
    assert_eq!(report.matched_count, 1);
    assert_eq!(report.skipped_count, 1);

    let records = h
        .index
        .fetch_by_ids(&[ada.id.clone(), grace.id.clone()])
        .await
        .unwrap();
    assert_eq!(records[&ada.id].metadata.match_id, grace.id);
    assert_eq!(records[&grace.id].metadata.match_id, ada.id);
}

#[tokio::test]
async fn test_matched_profiles_are_noops_for_future_runs() {
    let h = harness(5);

    h.service
        .insert_profile(input("Ada", "Sunrise runs along the river"), "o1")
        .await
        .unwrap();
    h.service
        .insert_profile(input("Grace", "Sunrise swims in the bay"), "o2")
        .await
        .unwrap();

    let first = h.engine.run_batch().await.unwrap();
    assert_eq!(first.matched_count, 1);

    // Everyone is matched now: the working set is empty
    let second = h.engine.run_batch().await.unwrap();
    assert_eq!(second.matched_count, 0);
    assert_eq!(second.skipped_count, 0);
}

#[tokio::test]
async fn test_odd_batch_completes_with_leftover_skipped() {
    let h = harness(5);

    let insights = [
        "Board game nights and puns",
        "Card games and wordplay",
        "Mountain treks at dawn",
        "Alpine hikes and early starts",
        "Collecting vintage synthesizers",
    ];
    for (i, insight) in insights.iter().enumerate() {
        h.service
            .insert_profile(input(&format!("User{}", i), insight), &format!("o{}", i))
            .await
            .unwrap();
    }

    let report = h.engine.run_batch().await.unwrap();

    // Five profiles can form at most two pairs; the batch must finish
    // and account for every profile it examined.
    assert_eq!(report.matched_count, 2);
    assert_eq!(report.skipped_count, 3);

    let records = all_records(&h.index).await;
    let by_id: HashMap<String, ProfileRecord> =
        records.iter().map(|r| (r.id.clone(), r.clone())).collect();

    let matched: Vec<&ProfileRecord> =
        records.iter().filter(|r| r.metadata.is_matched()).collect();
    assert_eq!(matched.len(), 4);
    assert_eq!(records.iter().filter(|r| !r.metadata.is_matched()).count(), 1);

    // Every link is mutual
    for record in matched {
        let partner = &by_id[&record.metadata.match_id];
        assert_eq!(partner.metadata.match_id, record.id);
        assert_ne!(partner.metadata.owner_id, record.metadata.owner_id);
    }
}

/// Index wrapper that simulates a concurrent run stealing the chosen
/// candidate between selection and the conditional write.
struct RacingIndex {
    inner: Arc<MemoryIndex>,
    raced: AtomicBool,
}

#[async_trait::async_trait]
impl VectorIndex for RacingIndex {
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn upsert(&self, records: &[ProfileRecord]) -> AppResult<()> {
        self.inner.upsert(records).await
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> AppResult<HashMap<String, ProfileRecord>> {
        self.inner.fetch_by_ids(ids).await
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &Filter,
        include_metadata: bool,
    ) -> AppResult<Vec<QueryMatch>> {
        let matches = self.inner.query(vector, top_k, filter, include_metadata).await?;

        let is_candidate_search = vector.iter().any(|v| *v != 0.0);
        if is_candidate_search && !matches.is_empty() && !self.raced.swap(true, Ordering::SeqCst) {
            // Steal the candidate before the caller can link it
            let stolen_id = matches[0].id.clone();
            let mut records = self.inner.fetch_by_ids(&[stolen_id.clone()]).await?;
            if let Some(mut record) = records.remove(&stolen_id) {
                record.metadata.match_id = "someone-else".to_string();
                self.inner.upsert(&[record]).await?;
            }
        }

        Ok(matches)
    }
}

#[tokio::test]
async fn test_candidate_stolen_before_write_is_not_double_assigned() {
    let inner = Arc::new(MemoryIndex::new(DIM));
    let racing = Arc::new(RacingIndex {
        inner: inner.clone(),
        raced: AtomicBool::new(false),
    });

    let embedder = Arc::new(TrigramEmbedder::new(DIM));
    let synthesizer = Arc::new(NarrativeSynthesizer::new(
        Arc::new(MockClient::new()),
        "mock-model",
    ));
    let service = ProfileService::new(
        racing.clone() as Arc<dyn VectorIndex>,
        embedder.clone(),
        synthesizer.clone(),
    );
    let engine = MatchingEngine::new(
        racing.clone() as Arc<dyn VectorIndex>,
        embedder,
        synthesizer,
        5,
    );

    let ada = service
        .insert_profile(input("Ada", "Evening pottery classes"), "o1")
        .await
        .unwrap();
    let grace = service
        .insert_profile(input("Grace", "Evening sculpture classes"), "o2")
        .await
        .unwrap();

    let report = engine.run_batch().await.unwrap();

    // The stolen candidate keeps its concurrent assignment; the seeker
    // is skipped rather than overwriting it.
    let records = inner
        .fetch_by_ids(&[ada.id.clone(), grace.id.clone()])
        .await
        .unwrap();
    let stolen = records
        .values()
        .find(|r| r.metadata.match_id == "someone-else");
    assert!(stolen.is_some());
    assert_eq!(report.matched_count, 0);

    // Neither record points at the other
    assert_ne!(records[&ada.id].metadata.match_id, grace.id);
    assert_ne!(records[&grace.id].metadata.match_id, ada.id);
}
