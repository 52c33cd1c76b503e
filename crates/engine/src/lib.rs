//! Kindred matching engine.
//!
//! Profile onboarding, narrative synthesis, embedding, and batch
//! matching over a vector index.

pub mod context;
pub mod embeddings;
pub mod matching;
pub mod narrative;
pub mod profile;
pub mod service;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use context::EngineContext;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use matching::MatchingEngine;
pub use narrative::NarrativeSynthesizer;
pub use profile::{MatchCandidate, MatchReport, Profile, ProfileInput};
pub use service::ProfileService;
