//! Vector index backends for profile storage and similarity retrieval.
//!
//! The [`VectorIndex`] trait abstracts over storage providers; two
//! backends ship here: a persistent LanceDB index and an in-memory
//! index with identical semantics.

pub mod filter;
pub mod lancedb;
pub mod memory;
pub mod migrate;
pub mod types;
pub mod vector_index;

pub use filter::{Condition, Filter, FilterOp, FilterValue};
pub use lancedb::LanceDbIndex;
pub use memory::MemoryIndex;
pub use migrate::migrate_metadata;
pub use types::{Gender, ProfileMetadata, ProfileRecord, QueryMatch};
pub use vector_index::{cosine_similarity, VectorIndex};
