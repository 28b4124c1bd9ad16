pub mod build;
pub mod config_cmd;
pub mod doctor;
pub mod estimate;
pub mod stats;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use ventana_config::{AppConfig, ConfigError, SummarizerConfig, SummarizerKind};
use ventana_context::{ContextRequest, ExtractiveSummarizer, ModelSummarizer, Summarize};

/// Load the config from an explicit path or the default location, with
/// environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_overrides(path, |key| std::env::var(key).ok()),
        None => AppConfig::load(),
    }
}

/// Read a request document from a file, or stdin when `input` is `-`.
pub fn read_request(input: &str) -> Result<ContextRequest, Box<dyn std::error::Error>> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).map_err(|e| format!("Failed to read {input}: {e}"))?
    };

    let request = ContextRequest::from_json(&raw).map_err(ventana_core::Error::from)?;
    Ok(request)
}

/// The summarizer selected by config, or the extractive one when forced.
pub fn summarizer_for(config: &SummarizerConfig, force_extractive: bool) -> Arc<dyn Summarize> {
    if force_extractive || config.kind == SummarizerKind::Extractive {
        tracing::debug!("Using extractive summarizer");
        return Arc::new(ExtractiveSummarizer);
    }

    let provider = ventana_providers::build_from_config(config);
    tracing::debug!(provider = %provider.name(), model = %config.model, "Using model summarizer");
    Arc::new(ModelSummarizer::new(provider, config.clone()))
}
