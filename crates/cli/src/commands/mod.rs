//! Command handlers for the Kindred CLI.

pub mod import;
pub mod insert;
pub mod profile;
pub mod run_match;
pub mod seed;
pub mod similar;

// Re-export command types for convenience
pub use import::ImportCommand;
pub use insert::InsertCommand;
pub use profile::ProfileCommand;
pub use run_match::MatchCommand;
pub use seed::SeedCommand;
pub use similar::SimilarCommand;
