//! Configuration loading, validation, and management for Ventana.
//!
//! Loads configuration from `~/.ventana/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! Every threshold the context generator uses lives here, so a process can
//! build one `AppConfig` at start-up and hand it to each generator it
//! creates; there is no global generator instance.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ventana/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Budgeting and sliding-window settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Summarization backend settings
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

/// Token budgeting and sliding-window parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Estimated total above which older history is summarized
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Number of trailing messages always kept verbatim
    #[serde(default = "default_preserve_recent")]
    pub preserve_recent_messages: usize,

    /// Advisory size for produced summaries (not enforced)
    #[serde(default = "default_summary_target")]
    pub summary_target_tokens: usize,

    /// Headroom subtracted from the budget before a summary is admitted
    #[serde(default = "default_safety_buffer")]
    pub safety_buffer_tokens: usize,

    /// Messages kept when even the recent window overflows the budget
    #[serde(default = "default_hard_truncate_keep")]
    pub hard_truncate_keep: usize,

    /// Hard ceiling of the downstream model, drives `within_limits`
    #[serde(default = "default_ceiling")]
    pub context_ceiling_tokens: usize,

    /// Fixed cost of one image at the model's normalized resolution
    #[serde(default = "default_tokens_per_image")]
    pub tokens_per_image: usize,

    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,

    #[serde(default = "default_word_token_factor")]
    pub word_token_factor: f64,

    /// Flat per-message cost for role label and separators
    #[serde(default = "default_message_overhead")]
    pub message_overhead_tokens: usize,
}

fn default_max_tokens() -> usize {
    100_000
}
fn default_preserve_recent() -> usize {
    10
}
fn default_summary_target() -> usize {
    20_000
}
fn default_safety_buffer() -> usize {
    200
}
fn default_hard_truncate_keep() -> usize {
    3
}
fn default_ceiling() -> usize {
    128_000
}
fn default_tokens_per_image() -> usize {
    256
}
fn default_chars_per_token() -> f64 {
    3.5
}
fn default_word_token_factor() -> f64 {
    1.3
}
fn default_message_overhead() -> usize {
    5
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            preserve_recent_messages: default_preserve_recent(),
            summary_target_tokens: default_summary_target(),
            safety_buffer_tokens: default_safety_buffer(),
            hard_truncate_keep: default_hard_truncate_keep(),
            context_ceiling_tokens: default_ceiling(),
            tokens_per_image: default_tokens_per_image(),
            chars_per_token: default_chars_per_token(),
            word_token_factor: default_word_token_factor(),
            message_overhead_tokens: default_message_overhead(),
        }
    }
}

/// Which summarizer implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizerKind {
    /// Call a small language model
    Model,
    /// Deterministic local digest, no network
    Extractive,
}

/// Summarization backend settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_summarizer_kind")]
    pub kind: SummarizerKind,

    /// Backend protocol: "ollama" or any OpenAI-compatible provider name
    #[serde(default = "default_summarizer_provider")]
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_summarizer_model")]
    pub model: String,

    #[serde(default = "default_summarizer_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Stop sequences; they match the role markers of the rendered transcript
    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
}

fn default_summarizer_kind() -> SummarizerKind {
    SummarizerKind::Model
}
fn default_summarizer_provider() -> String {
    "ollama".into()
}
fn default_summarizer_model() -> String {
    "gemma3n:e4b".into()
}
fn default_summarizer_temperature() -> f32 {
    0.3
}
fn default_top_p() -> f32 {
    0.8
}
fn default_max_output_tokens() -> u32 {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_stop() -> Vec<String> {
    vec!["[USER]:".into(), "[ASSISTANT]:".into()]
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            kind: default_summarizer_kind(),
            provider: default_summarizer_provider(),
            api_url: None,
            api_key: None,
            model: default_summarizer_model(),
            temperature: default_summarizer_temperature(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            stop: default_stop(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("kind", &self.kind)
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("stop", &self.stop)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ventana/config.toml).
    ///
    /// Environment variables override file values:
    /// - `VENTANA_MAX_TOKENS`
    /// - `VENTANA_SUMMARIZER_URL` (falls back to `OLLAMA_API_URL`)
    /// - `VENTANA_SUMMARIZER_MODEL`
    /// - `VENTANA_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_overrides(&config_path, |key| std::env::var(key).ok())
    }

    /// Load a file, apply overrides from `lookup`, and validate the result.
    pub fn load_with_overrides(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(lookup);
        config.validate()?;
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
    /// production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup("VENTANA_MAX_TOKENS") {
            match raw.trim().parse::<usize>() {
                Ok(max) => self.context.max_tokens = max,
                Err(_) => tracing::warn!(value = %raw, "Ignoring non-numeric VENTANA_MAX_TOKENS"),
            }
        }

        if let Some(url) = lookup("VENTANA_SUMMARIZER_URL").or_else(|| lookup("OLLAMA_API_URL")) {
            self.summarizer.api_url = Some(url);
        }

        if let Some(model) = lookup("VENTANA_SUMMARIZER_MODEL") {
            self.summarizer.model = model;
        }

        if self.summarizer.api_key.is_none() {
            self.summarizer.api_key = lookup("VENTANA_API_KEY");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ventana")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.preserve_recent_messages == 0 {
            return Err(ConfigError::ValidationError(
                "context.preserve_recent_messages must be at least 1".into(),
            ));
        }

        if self.context.hard_truncate_keep == 0 {
            return Err(ConfigError::ValidationError(
                "context.hard_truncate_keep must be at least 1".into(),
            ));
        }

        if !self.context.chars_per_token.is_finite() || self.context.chars_per_token <= 0.0 {
            return Err(ConfigError::ValidationError(
                "context.chars_per_token must be a finite number > 0".into(),
            ));
        }

        if !self.context.word_token_factor.is_finite() || self.context.word_token_factor < 0.0 {
            return Err(ConfigError::ValidationError(
                "context.word_token_factor must be a finite number >= 0".into(),
            ));
        }

        if self.summarizer.kind == SummarizerKind::Model && self.summarizer.model.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "summarizer.model must not be empty".into(),
            ));
        }

        if self.summarizer.temperature < 0.0 || self.summarizer.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "summarizer.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.summarizer.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "summarizer.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
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
        assert_eq!(config.context.max_tokens, 100_000);
        assert_eq!(config.context.preserve_recent_messages, 10);
        assert_eq!(config.context.context_ceiling_tokens, 128_000);
        assert_eq!(config.summarizer.kind, SummarizerKind::Model);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.context.max_tokens, config.context.max_tokens);
        assert_eq!(parsed.summarizer.stop, config.summarizer.stop);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
[context]
max_tokens = 5000

[summarizer]
kind = "extractive"
"#,
        )
        .unwrap();
        assert_eq!(parsed.context.max_tokens, 5000);
        assert_eq!(parsed.context.preserve_recent_messages, 10);
        assert_eq!(parsed.summarizer.kind, SummarizerKind::Extractive);
        assert_eq!(parsed.summarizer.timeout_secs, 30);
    }

    #[test]
    fn zero_recent_window_rejected() {
        let mut config = AppConfig::default();
        config.context.preserve_recent_messages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn degenerate_estimator_settings_rejected() {
        let broken = [
            ContextConfig {
                chars_per_token: f64::NAN,
                ..ContextConfig::default()
            },
            ContextConfig {
                chars_per_token: f64::INFINITY,
                ..ContextConfig::default()
            },
            ContextConfig {
                word_token_factor: -1.0,
                ..ContextConfig::default()
            },
            ContextConfig {
                word_token_factor: f64::NAN,
                ..ContextConfig::default()
            },
            ContextConfig {
                hard_truncate_keep: 0,
                ..ContextConfig::default()
            },
        ];
        for context in broken {
            let config = AppConfig {
                context,
                ..AppConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "accepted {:?}",
                config.context
            );
        }
    }

    #[test]
    fn zero_word_factor_is_allowed() {
        let mut config = AppConfig::default();
        config.context.word_token_factor = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.summarizer.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.summarizer.provider, "ollama");
    }

    #[test]
    fn load_from_reads_and_validates_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context]\npreserve_recent_messages = 0").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context]\nmax_tokens = 42").unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.context.max_tokens, 42);
    }

    #[test]
    fn unparseable_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context\nmax_tokens = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn overrides_apply_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("VENTANA_MAX_TOKENS", "2048"),
            ("OLLAMA_API_URL", "http://ollama:11434/api/generate"),
            ("VENTANA_SUMMARIZER_MODEL", "llama3.2:1b"),
            ("VENTANA_API_KEY", "sk-test"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.context.max_tokens, 2048);
        assert_eq!(
            config.summarizer.api_url.as_deref(),
            Some("http://ollama:11434/api/generate")
        );
        assert_eq!(config.summarizer.model, "llama3.2:1b");
        assert_eq!(config.summarizer.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn overrides_are_validated_after_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[summarizer]\nmodel = \"gemma3n:e4b\"").unwrap();

        let err = AppConfig::load_with_overrides(file.path(), |k| {
            (k == "VENTANA_SUMMARIZER_MODEL").then(|| " ".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let config = AppConfig::load_with_overrides(file.path(), |k| {
            (k == "VENTANA_MAX_TOKENS").then(|| "2048".to_string())
        })
        .unwrap();
        assert_eq!(config.context.max_tokens, 2048);
    }

    #[test]
    fn bad_numeric_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|k| (k == "VENTANA_MAX_TOKENS").then(|| "lots".to_string()));
        assert_eq!(config.context.max_tokens, 100_000);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut config = AppConfig::default();
        config.summarizer.api_key = Some("sk-secret".into());
        let dbg = format!("{config:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("sk-secret"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_tokens = 100000"));
        assert!(toml_str.contains("gemma3n:e4b"));
    }
}
