//! Configuration management for the Sahayak assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (sahayak.yaml in the data directory)
//!
//! The configuration is data-directory-centric: the pre-built vector index
//! and the query log both live under `data_dir`.
//!
//! The confidence/threshold values are policy parameters, not contract: they
//! are exposed here as tunable configuration and validated for internal
//! consistency, nothing more.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// pipeline behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the data directory (index database, query log)
    pub data_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider (e.g., "ollama", "groq")
    pub provider: String,

    /// Model identifier for answer synthesis
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Query validation limits
    #[serde(default)]
    pub query: QueryConfig,

    /// Embedding settings (must match the external indexer)
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Confidence and fallback policy parameters
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Session store settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Completion call settings
    #[serde(default)]
    pub llm: LlmSettings,
}

/// Limits applied before a request enters the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum accepted query length in characters
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,
}

fn default_max_query_length() -> usize {
    500
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_query_length: default_max_query_length(),
        }
    }
}

/// Embedding settings.
///
/// The embedder is shared between indexing and querying; these values must
/// match whatever the external indexer used, or distances are meaningless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider ("hash", "ollama")
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Embedding model (only meaningful for remote providers)
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dim")]
    pub dimensions: usize,
}

fn default_embedding_provider() -> String {
    "hash".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_dim() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_embedding_dim(),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of passages requested from the index per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Distance reduction applied to passages matching the topic hint.
    /// Re-ranks only; never excludes.
    #[serde(default = "default_topic_boost")]
    pub topic_boost: f32,
}

fn default_top_k() -> usize {
    5
}

fn default_topic_boost() -> f32 {
    0.05
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            topic_boost: default_topic_boost(),
        }
    }
}

/// Confidence scoring and fallback policy parameters.
///
/// Documented effect of each knob:
/// - `high_threshold`: raises the bar for unhedged answers
/// - `low_threshold`: raises the bar for refusing outright
/// - `top1_weight`: how much a single strong match dominates the score
/// - `accept_threshold`: best similarity below this is penalized
/// - `shortfall_penalty`: per-missing-result reduction when fewer than
///   `top_k` passages came back
/// - `accept_penalty`: multiplier applied when the best similarity is
///   below `accept_threshold`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f32,

    #[serde(default = "default_low_threshold")]
    pub low_threshold: f32,

    #[serde(default = "default_top1_weight")]
    pub top1_weight: f32,

    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f32,

    #[serde(default = "default_shortfall_penalty")]
    pub shortfall_penalty: f32,

    #[serde(default = "default_accept_penalty")]
    pub accept_penalty: f32,
}

fn default_high_threshold() -> f32 {
    0.75
}

fn default_low_threshold() -> f32 {
    0.40
}

fn default_top1_weight() -> f32 {
    0.60
}

fn default_accept_threshold() -> f32 {
    0.55
}

fn default_shortfall_penalty() -> f32 {
    0.30
}

fn default_accept_penalty() -> f32 {
    0.60
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            high_threshold: default_high_threshold(),
            low_threshold: default_low_threshold(),
            top1_weight: default_top1_weight(),
            accept_threshold: default_accept_threshold(),
            shortfall_penalty: default_shortfall_penalty(),
            accept_penalty: default_accept_penalty(),
        }
    }
}

/// Session store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity window after which a session may be evicted, in minutes.
    /// Eviction is advisory cleanup, not correctness-critical.
    #[serde(default = "default_idle_minutes")]
    pub idle_minutes: u64,

    /// Number of recent turns prepended to the synthesis prompt
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

fn default_idle_minutes() -> u64 {
    30
}

fn default_history_turns() -> usize {
    2
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_minutes: default_idle_minutes(),
            history_turns: default_history_turns(),
        }
    }
}

/// Completion call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider endpoint override
    pub endpoint: Option<String>,

    /// Hard timeout for a single completion call, in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// Backoff before the single retry, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Maximum tokens generated per answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (low for factual answers)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_llm_timeout_secs(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    provider: Option<String>,
    model: Option<String>,
    query: Option<QueryConfig>,
    embedding: Option<EmbeddingConfig>,
    retrieval: Option<RetrievalConfig>,
    policy: Option<PolicyConfig>,
    session: Option<SessionConfig>,
    llm: Option<LlmSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            query: QueryConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            policy: PolicyConfig::default(),
            session: SessionConfig::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `SAHAYAK_DATA_DIR`: Override data directory
    /// - `SAHAYAK_CONFIG`: Path to config file
    /// - `SAHAYAK_PROVIDER`: LLM provider
    /// - `SAHAYAK_MODEL`: Model identifier
    /// - `SAHAYAK_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(data_dir) = std::env::var("SAHAYAK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(config_file) = std::env::var("SAHAYAK_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.data_dir.join("sahayak.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("SAHAYAK_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("SAHAYAK_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("SAHAYAK_API_KEY").ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(provider) = config_file.provider {
            result.provider = provider;
        }

        if let Some(model) = config_file.model {
            result.model = model;
        }

        if let Some(query) = config_file.query {
            result.query = query;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(policy) = config_file.policy {
            result.policy = policy;
        }

        if let Some(session) = config_file.session {
            result.session = session;
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
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
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }

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

    /// Path to the pre-built vector index database.
    pub fn index_db_path(&self) -> PathBuf {
        self.data_dir.join("passages.db")
    }

    /// Path to the append-only query log.
    pub fn query_log_path(&self) -> PathBuf {
        self.data_dir.join("logs").join("queries.jsonl")
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama", "groq", "openai"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        let p = &self.policy;
        if !(0.0..=1.0).contains(&p.low_threshold)
            || !(0.0..=1.0).contains(&p.high_threshold)
            || p.low_threshold >= p.high_threshold
        {
            return Err(AppError::Config(format!(
                "Policy thresholds must satisfy 0 <= low < high <= 1 (got low={}, high={})",
                p.low_threshold, p.high_threshold
            )));
        }

        if !(0.0..=1.0).contains(&p.top1_weight) {
            return Err(AppError::Config(format!(
                "top1_weight must be in [0, 1] (got {})",
                p.top1_weight
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
