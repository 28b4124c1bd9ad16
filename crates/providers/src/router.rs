//! Provider construction from configuration.

use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatProvider;
use std::sync::Arc;
use std::time::Duration;
use ventana_config::SummarizerConfig;
use ventana_core::provider::Provider;

/// Build the summarization provider described by the config.
///
/// The HTTP client timeout matches the summarizer timeout so a hung
/// connection is torn down rather than left behind the caller's deadline.
pub fn build_from_config(config: &SummarizerConfig) -> Arc<dyn Provider> {
    let base_url = config
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(&config.provider));
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.provider.as_str() {
        "ollama" => Arc::new(OllamaProvider::new(base_url).with_timeout(timeout)),
        name => {
            let api_key = config.api_key.clone().unwrap_or_default();
            Arc::new(OpenAiCompatProvider::new(name, base_url, api_key).with_timeout(timeout))
        }
    }
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "ollama" => "http://localhost:11434".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
