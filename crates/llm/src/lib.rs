//! Kindred LLM Library
//!
//! Text-generation client abstraction and provider implementations.

pub mod client;
pub mod factory;
pub mod providers;

// Re-export commonly used types
pub use client::{GenerationRequest, GenerationResponse, LlmClient, Usage};
pub use factory::create_client;
