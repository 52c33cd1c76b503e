//! Configuration management for Kindred.
//!
//! Configuration is merged from three sources, lowest precedence first:
//! - Built-in defaults
//! - A YAML config file (`kindred.yaml`)
//! - `KINDRED_*` environment variables
//!
//! CLI flags are applied on top via [`AppConfig::with_overrides`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Holds everything needed to build the long-lived client handles:
/// the text-generation provider, the embedding provider (with the
/// deployment-wide vector dimension `D`), and the vector index backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Text-generation provider (e.g., "ollama", "openai", "mock")
    pub provider: String,

    /// Text-generation model identifier
    pub model: String,

    /// Embedding provider (e.g., "ollama", "openai", "trigram")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding vector dimension, fixed at deployment
    pub embedding_dim: usize,

    /// API key for remote providers
    pub api_key: Option<String>,

    /// Vector index backend settings
    pub index: IndexConfig,

    /// Matching engine settings
    pub matching: MatchingConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Vector index backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Backend identifier: "lancedb" or "memory"
    pub backend: String,

    /// On-disk location for persistent backends
    pub path: PathBuf,

    /// Table holding the profile records
    pub table: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: "lancedb".to_string(),
            path: PathBuf::from("./data/kindred.lancedb"),
            table: "profiles".to_string(),
        }
    }
}

/// Matching engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Unmatched profiles pulled per batch run
    #[serde(rename = "batchSize")]
    pub batch_size: usize,

    /// Default number of neighbors for similarity lookups
    #[serde(rename = "similarTopK")]
    pub similar_top_k: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            similar_top_k: 2,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    index: Option<IndexSection>,
    matching: Option<MatchingConfig>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexSection {
    backend: Option<String>,
    path: Option<String>,
    table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            api_key: None,
            index: IndexConfig::default(),
            matching: MatchingConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `KINDRED_CONFIG`: Path to config file (default: `./kindred.yaml`)
    /// - `KINDRED_PROVIDER`: Text-generation provider
    /// - `KINDRED_MODEL`: Model identifier
    /// - `KINDRED_EMBEDDING_PROVIDER`: Embedding provider
    /// - `KINDRED_EMBEDDING_MODEL`: Embedding model
    /// - `KINDRED_EMBEDDING_DIM`: Vector dimension
    /// - `KINDRED_API_KEY`: API key for remote providers
    /// - `KINDRED_INDEX_PATH`: Vector index location
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_with(None)
    }

    /// Load configuration, preferring an explicitly named config file.
    ///
    /// Precedence for the file location: explicit path (CLI flag) >
    /// `KINDRED_CONFIG` > `./kindred.yaml`. An explicitly named file
    /// that does not exist is an error; the implicit default is
    /// allowed to be absent.
    pub fn load_with(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();
        config.config_file = config_file;

        if config.config_file.is_none() {
            if let Ok(config_file) = std::env::var("KINDRED_CONFIG") {
                config.config_file = Some(PathBuf::from(config_file));
            }
        }

        match config.config_file.clone() {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file not found: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let default_path = PathBuf::from("kindred.yaml");
                if default_path.exists() {
                    config = config.merge_yaml(&default_path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("KINDRED_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("KINDRED_MODEL") {
            config.model = model;
        }

        if let Ok(provider) = std::env::var("KINDRED_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        if let Ok(model) = std::env::var("KINDRED_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        if let Ok(dim) = std::env::var("KINDRED_EMBEDDING_DIM") {
            config.embedding_dim = dim.parse().map_err(|_| {
                AppError::Config(format!("Invalid KINDRED_EMBEDDING_DIM: {}", dim))
            })?;
        }

        if let Ok(path) = std::env::var("KINDRED_INDEX_PATH") {
            config.index.path = PathBuf::from(path);
        }

        config.api_key = std::env::var("KINDRED_API_KEY").ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(env_var) = llm.api_key_env {
                if let Ok(key) = std::env::var(&env_var) {
                    result.api_key = Some(key);
                }
            }
        }

        if let Some(embedding) = config_file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
            if let Some(dim) = embedding.dimensions {
                result.embedding_dim = dim;
            }
        }

        if let Some(index) = config_file.index {
            if let Some(backend) = index.backend {
                result.index.backend = backend;
            }
            if let Some(path) = index.path {
                result.index.path = PathBuf::from(path);
            }
            if let Some(table) = index.table {
                result.index.table = table;
            }
        }

        if let Some(matching) = config_file.matching {
            result.matching = matching;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over both environment variables and the
    /// config file.
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate configuration before any client is constructed.
    ///
    /// Missing credentials and impossible settings abort startup here
    /// rather than failing deep inside a batch run.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama", "openai", "mock"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        let known_embedding_providers = ["ollama", "openai", "trigram"];
        if !known_embedding_providers.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_embedding_providers.join(", ")
            )));
        }

        if self.embedding_dim == 0 {
            return Err(AppError::Config(
                "Embedding dimension must be greater than zero".to_string(),
            ));
        }

        if (self.provider == "openai" || self.embedding_provider == "openai")
            && self.api_key.is_none()
        {
            return Err(AppError::Config(
                "OpenAI providers require an API key (KINDRED_API_KEY)".to_string(),
            ));
        }

        let known_backends = ["lancedb", "memory"];
        if !known_backends.contains(&self.index.backend.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown index backend: {}. Supported: {}",
                self.index.backend,
                known_backends.join(", ")
            )));
        }

        if self.matching.batch_size == 0 {
            return Err(AppError::Config(
                "Matching batch size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.embedding_provider, "ollama");
        assert_eq!(config.embedding_dim, 768);
        assert_eq!(config.index.backend, "lancedb");
        assert_eq!(config.matching.batch_size, 5);
        assert!(!config.verbose);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            Some("openai".to_string()),
            Some("gpt-4".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_openai_requires_api_key() {
        let mut config = AppConfig::default();
        config.embedding_provider = "openai".to_string();
        config.api_key = None;
        assert!(config.validate().is_err());

        config.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_dimension() {
        let mut config = AppConfig::default();
        config.embedding_dim = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_backend() {
        let mut config = AppConfig::default();
        config.index.backend = "postgres".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_with_explicit_path() {
        let dir = std::env::temp_dir().join(format!("kindred-load-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("custom.yaml");
        std::fs::write(&path, "llm:\n  provider: mock\n").unwrap();

        let config = AppConfig::load_with(Some(path.clone())).unwrap();
        assert_eq!(config.provider, "mock");
        assert_eq!(config.config_file, Some(path));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_with_missing_explicit_path_errors() {
        let result = AppConfig::load_with(Some(PathBuf::from("/nonexistent/kindred.yaml")));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_merge_yaml() {
        let dir = std::env::temp_dir().join(format!("kindred-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kindred.yaml");
        std::fs::write(
            &path,
            "llm:\n  provider: mock\n  model: scripted\nembedding:\n  provider: trigram\n  dimensions: 384\nmatching:\n  batchSize: 3\n  similarTopK: 4\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        let merged = config.merge_yaml(&path).unwrap();

        assert_eq!(merged.provider, "mock");
        assert_eq!(merged.model, "scripted");
        assert_eq!(merged.embedding_provider, "trigram");
        assert_eq!(merged.embedding_dim, 384);
        assert_eq!(merged.matching.batch_size, 3);
        assert_eq!(merged.matching.similar_top_k, 4);

        std::fs::remove_dir_all(&dir).ok();
    }
}
