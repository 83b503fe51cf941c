//! Configuration loading, validation, and management for Verdant.
//!
//! Loads configuration from `~/.verdant/config.toml` (or an explicit
//! path) with environment variable overrides. Validates all settings at
//! startup so misconfiguration fails fast instead of mid-conversation.
//!
//! Environment overrides:
//! - `VERDANT_API_KEY` — language-model API key
//! - `VERDANT_MODEL` — model name
//! - `VERDANT_WEATHER_API_KEY` — weather provider key
//! - `VERDANT_SEARCH_ENABLED` — "true"/"1" enables web search

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps directly to `~/.verdant/config.toml`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Language-model backend settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Memory store settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Knowledge retriever settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (usually supplied via VERDANT_API_KEY instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum reasoning steps per turn
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Wall-clock budget for one turn, in seconds
    #[serde(default = "default_turn_budget")]
    pub turn_budget_secs: u64,

    /// Whether the reflection pass runs after each draft
    #[serde(default = "default_true")]
    pub reflection: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Long-term index backend: "file" or "in_memory"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// Path for the file backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Short-term window size (turns per user)
    #[serde(default = "default_window")]
    pub window: usize,

    /// Long-term records recalled per query
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path to the plant corpus JSON (seeded with defaults when missing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,

    /// Snippets retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum relevance score for a snippet to be returned
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// OpenWeatherMap API key (or VERDANT_WEATHER_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_api_key: Option<String>,

    /// Weather API base URL (overridable for tests)
    #[serde(default = "default_weather_url")]
    pub weather_base_url: String,

    /// Whether the web_search tool is enabled
    #[serde(default)]
    pub search_enabled: bool,

    /// Path to the durable reminder store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_path: Option<PathBuf>,

    /// Reminder dedupe window in hours
    #[serde(default = "default_dedupe_hours")]
    pub reminder_dedupe_hours: u64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_steps() -> usize {
    6
}
fn default_turn_budget() -> u64 {
    60
}
fn default_true() -> bool {
    true
}
fn default_memory_backend() -> String {
    "file".into()
}
fn default_window() -> usize {
    10
}
fn default_recall_limit() -> usize {
    3
}
fn default_top_k() -> usize {
    3
}
fn default_min_score() -> f32 {
    0.1
}
fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5".into()
}
fn default_dedupe_hours() -> u64 {
    24
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            turn_budget_secs: default_turn_budget(),
            reflection: true,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
            window: default_window(),
            recall_limit: default_recall_limit(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            corpus_path: None,
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            weather_base_url: default_weather_url(),
            search_enabled: false,
            reminder_path: None,
            reminder_dedupe_hours: default_dedupe_hours(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider.base_url", &self.provider.base_url)
            .field("provider.api_key", &redact(&self.provider.api_key))
            .field("provider.model", &self.provider.model)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("knowledge", &self.knowledge)
            .field("tools.weather_api_key", &redact(&self.tools.weather_api_key))
            .field("tools.search_enabled", &self.tools.search_enabled)
            .finish()
    }
}

impl AppConfig {
    /// Default config file path: `~/.verdant/config.toml`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".verdant").join("config.toml")
    }

    /// The data directory: `~/.verdant/`.
    pub fn data_dir() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".verdant")
    }

    /// Load configuration from the given path (or the default location),
    /// apply environment overrides, and validate.
    ///
    /// A missing file yields defaults — everything has a sensible
    /// fallback except the API keys, which come from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&content)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML string (used by tests and the status command).
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("VERDANT_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("VERDANT_MODEL") {
            self.provider.model = model;
        }
        if let Ok(key) = std::env::var("VERDANT_WEATHER_API_KEY") {
            self.tools.weather_api_key = Some(key);
        }
        if let Ok(flag) = std::env::var("VERDANT_SEARCH_ENABLED") {
            self.tools.search_enabled = matches!(flag.as_str(), "true" | "1" | "yes");
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::Invalid(format!(
                "provider.temperature must be in [0, 2], got {}",
                self.provider.temperature
            )));
        }
        if self.agent.max_steps == 0 {
            return Err(ConfigError::Invalid("agent.max_steps must be at least 1".into()));
        }
        if self.agent.turn_budget_secs == 0 {
            return Err(ConfigError::Invalid(
                "agent.turn_budget_secs must be at least 1".into(),
            ));
        }
        if self.memory.window == 0 {
            return Err(ConfigError::Invalid("memory.window must be at least 1".into()));
        }
        match self.memory.backend.as_str() {
            "file" | "in_memory" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "memory.backend must be 'file' or 'in_memory', got '{other}'"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.knowledge.min_score) {
            return Err(ConfigError::Invalid(
                "knowledge.min_score must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}
