//! Configuration loading, validation, and management for slotwise.
//!
//! Loads configuration from `~/.slotwise/config.toml` with environment
//! variable overrides. Every value is validated before a context manager
//! is built from it, so bad settings surface at construction time rather
//! than in the middle of a conversation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.slotwise/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Retention policy and priority settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Retrieval collaborator settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Compression collaborator settings
    #[serde(default)]
    pub compression: CompressionConfig,
}

/// Capacity, recency window and the priority ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum number of slots kept in the sequence (token budget proxy)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Number of trailing slots exempt from compression
    #[serde(default = "default_recency_window")]
    pub recency_window: usize,

    /// Slots at or above this priority are never compressed or evicted
    #[serde(default = "default_protected_threshold")]
    pub protected_threshold: i32,

    /// Priority of the seeded system instruction
    #[serde(default = "default_system_priority")]
    pub system_priority: i32,

    /// Priority assigned to compression summaries
    #[serde(default = "default_summary_priority")]
    pub summary_priority: i32,

    /// Priority assigned to retrieved passages
    #[serde(default = "default_retrieved_priority")]
    pub retrieved_priority: i32,

    /// Priority for ordinary turns
    #[serde(default = "default_priority")]
    pub default_priority: i32,

    /// Text of the seeded system instruction
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
}

fn default_capacity() -> usize {
    6
}
fn default_recency_window() -> usize {
    2
}
fn default_protected_threshold() -> i32 {
    100
}
fn default_system_priority() -> i32 {
    100
}
fn default_summary_priority() -> i32 {
    50
}
fn default_retrieved_priority() -> i32 {
    10
}
fn default_priority() -> i32 {
    1
}
fn default_system_instruction() -> String {
    "You are a professional hardware repair expert. Answer concisely.".into()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            recency_window: default_recency_window(),
            protected_threshold: default_protected_threshold(),
            system_priority: default_system_priority(),
            summary_priority: default_summary_priority(),
            retrieved_priority: default_retrieved_priority(),
            default_priority: default_priority(),
            system_instruction: default_system_instruction(),
        }
    }
}

impl ContextConfig {
    /// Check the capacity, window and priority ladder.
    ///
    /// Ordinary, retrieved and summary priorities must sit strictly below
    /// the protected threshold; the system instruction must sit at or above it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "context.capacity must be at least 1".into(),
            ));
        }

        if self.recency_window == 0 {
            return Err(ConfigError::ValidationError(
                "context.recency_window must be at least 1".into(),
            ));
        }

        if self.system_priority < self.protected_threshold {
            return Err(ConfigError::ValidationError(format!(
                "context.system_priority ({}) must be >= protected_threshold ({})",
                self.system_priority, self.protected_threshold
            )));
        }

        for (name, value) in [
            ("summary_priority", self.summary_priority),
            ("retrieved_priority", self.retrieved_priority),
            ("default_priority", self.default_priority),
        ] {
            if value >= self.protected_threshold {
                return Err(ConfigError::ValidationError(format!(
                    "context.{name} ({value}) must be below protected_threshold ({})",
                    self.protected_threshold
                )));
            }
        }

        if self.system_instruction.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "context.system_instruction must not be empty".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Upper bound for a single retrieval call
    #[serde(default = "default_retrieval_timeout_ms")]
    pub timeout_ms: u64,

    /// Optional JSON file with knowledge entries for the in-memory retriever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_file: Option<PathBuf>,
}

fn default_retrieval_timeout_ms() -> u64 {
    2_000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_retrieval_timeout_ms(),
            knowledge_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Summarizer strategy: "concat" or "keyword_merge"
    #[serde(default = "default_compression_method")]
    pub method: String,

    /// Upper bound for a single summarizer call
    #[serde(default = "default_compression_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum characters of joined source text kept in a summary (0 = unlimited)
    #[serde(default = "default_max_summary_chars")]
    pub max_summary_chars: usize,
}

fn default_compression_method() -> String {
    "concat".into()
}
fn default_compression_timeout_ms() -> u64 {
    5_000
}
fn default_max_summary_chars() -> usize {
    200
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            method: default_compression_method(),
            timeout_ms: default_compression_timeout_ms(),
            max_summary_chars: default_max_summary_chars(),
        }
    }
}

/// Summarizer strategies understood by `compression.method`.
pub const COMPRESSION_METHODS: &[&str] = &["concat", "keyword_merge"];

impl AppConfig {
    /// Load configuration from the default path (~/.slotwise/config.toml).
    ///
    /// Environment variables override file values:
    /// - `SLOTWISE_CAPACITY`
    /// - `SLOTWISE_RECENCY_WINDOW`
    /// - `SLOTWISE_SYSTEM_PROMPT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// [`AppConfig::load`]), then re-validate.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("SLOTWISE_CAPACITY") {
            self.context.capacity = parse_override("SLOTWISE_CAPACITY", &raw)?;
        }

        if let Some(raw) = lookup("SLOTWISE_RECENCY_WINDOW") {
            self.context.recency_window = parse_override("SLOTWISE_RECENCY_WINDOW", &raw)?;
        }

        if let Some(prompt) = lookup("SLOTWISE_SYSTEM_PROMPT") {
            self.context.system_instruction = prompt;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".slotwise")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.context.validate()?;

        if self.retrieval.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.timeout_ms must be > 0".into(),
            ));
        }

        if self.compression.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "compression.timeout_ms must be > 0".into(),
            ));
        }

        if !COMPRESSION_METHODS.contains(&self.compression.method.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "compression.method '{}' is not one of {:?}",
                self.compression.method, COMPRESSION_METHODS
            )));
        }

        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        Self::default().to_toml().unwrap_or_default()
    }
}

fn parse_override(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{key} must be a positive integer, got '{raw}'"))
    })
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.context.capacity, 6);
        assert_eq!(config.context.recency_window, 2);
        assert_eq!(config.context.protected_threshold, 100);
        assert_eq!(config.context.summary_priority, 50);
        assert_eq!(config.context.retrieved_priority, 10);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.context.capacity, config.context.capacity);
        assert_eq!(parsed.compression.method, config.compression.method);
    }

    #[test]
    fn zero_capacity_rejected() {
        let mut config = AppConfig::default();
        config.context.capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn zero_recency_window_rejected() {
        let mut config = AppConfig::default();
        config.context.recency_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn summary_priority_at_threshold_rejected() {
        let mut config = AppConfig::default();
        config.context.summary_priority = 100;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("summary_priority"));
    }

    #[test]
    fn system_priority_below_threshold_rejected() {
        let mut config = AppConfig::default();
        config.context.system_priority = 99;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_compression_method_rejected() {
        let mut config = AppConfig::default();
        config.compression.method = "llm".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("llm"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.context.capacity, 6);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[context]
capacity = 10

[compression]
method = "keyword_merge"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.context.capacity, 10);
        assert_eq!(config.context.recency_window, 2);
        assert_eq!(config.compression.method, "keyword_merge");
        assert_eq!(config.retrieval.timeout_ms, 2_000);
    }

    #[test]
    fn invalid_file_values_rejected_on_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context]\ncapacity = 0").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context\ncapacity = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn overrides_apply_and_revalidate() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SLOTWISE_CAPACITY", "12"),
            ("SLOTWISE_RECENCY_WINDOW", "3"),
            ("SLOTWISE_SYSTEM_PROMPT", "You are a router expert."),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.context.capacity, 12);
        assert_eq!(config.context.recency_window, 3);
        assert_eq!(config.context.system_instruction, "You are a router expert.");
    }

    #[test]
    fn non_numeric_override_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| (key == "SLOTWISE_CAPACITY").then(|| "six".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("SLOTWISE_CAPACITY"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("capacity = 6"));
        assert!(toml_str.contains("concat"));
    }
}
