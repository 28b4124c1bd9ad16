//! Native Ollama provider using the `/api/generate` endpoint.
//!
//! Ollama's generate API takes a single raw prompt plus sampling `options`
//! and answers with one JSON object when `stream` is false:
//!
//! ```json
//! {"model": "gemma3n:e4b", "response": "...", "done": true,
//!  "prompt_eval_count": 812, "eval_count": 96}
//! ```

use crate::openai_compat::http_client;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use ventana_core::error::ProviderError;
use ventana_core::message::Message;
use ventana_core::provider::*;

const GENERATE_PATH: &str = "/api/generate";

/// Provider for a local or remote Ollama server.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a provider for the server at `base_url`.
    ///
    /// Accepts either the server root (`http://ollama:11434`) or the full
    /// generate endpoint URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/');
        let base_url = base_url.strip_suffix(GENERATE_PATH).unwrap_or(base_url);

        Self {
            base_url: base_url.to_string(),
            client: http_client(Duration::from_secs(120)),
        }
    }

    /// Provider for the default local server.
    pub fn local() -> Self {
        Self::new("http://localhost:11434")
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut options = serde_json::json!({
            "temperature": request.temperature,
        });

        if let Some(top_p) = request.top_p {
            options["top_p"] = serde_json::json!(top_p);
        }

        if let Some(max_tokens) = request.max_tokens {
            options["num_predict"] = serde_json::json!(max_tokens);
        }

        if !request.stop.is_empty() {
            options["stop"] = serde_json::json!(request.stop);
        }

        serde_json::json!({
            "model": request.model,
            "prompt": request.prompt(),
            "stream": false,
            "options": options,
        })
    }
}

#[async_trait]
impl ventana_core::Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}{}", self.base_url, GENERATE_PATH);
        let body = Self::request_body(&request);

        debug!(model = %request.model, url = %url, "Sending generate request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 404 {
            return Err(ProviderError::NotConfigured(format!(
                "Model '{}' is not available on {}",
                request.model, self.base_url
            )));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Ollama returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        Ok(api_response.into_provider_response(request.model))
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl GenerateResponse {
    fn into_provider_response(self, requested_model: String) -> ProviderResponse {
        let usage = match (self.prompt_eval_count, self.eval_count) {
            (Some(prompt), Some(completion)) => Some(Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        ProviderResponse {
            message: Message::assistant(self.response),
            usage,
            model: self.model.unwrap_or(requested_model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ventana_core::Provider;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "gemma3n:e4b".into(),
            messages: vec![Message::user("RESUMEN CONCISO:")],
            temperature: 0.3,
            top_p: Some(0.8),
            max_tokens: Some(1000),
            stop: vec!["[USER]:".into(), "[ASSISTANT]:".into()],
        }
    }

    #[test]
    fn accepts_full_generate_url() {
        let provider = OllamaProvider::new("http://ollama:11434/api/generate");
        assert_eq!(provider.base_url, "http://ollama:11434");
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn local_constructor() {
        assert_eq!(OllamaProvider::local().base_url, "http://localhost:11434");
    }

    #[test]
    fn request_body_maps_sampling_options() {
        let body = OllamaProvider::request_body(&request());
        assert_eq!(body["model"], "gemma3n:e4b");
        assert_eq!(body["prompt"], "RESUMEN CONCISO:");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 1000);
        assert_eq!(body["options"]["stop"][0], "[USER]:");
        assert!(body["options"]["top_p"].as_f64().is_some());
    }

    #[test]
    fn parse_generate_response() {
        let data = r#"{"model":"gemma3n:e4b","response":"Se habló de recetas.","done":true,
                       "prompt_eval_count":120,"eval_count":8}"#;
        let parsed: GenerateResponse = serde_json::from_str(data).unwrap();
        let response = parsed.into_provider_response("x".into());
        assert_eq!(response.message.content, "Se habló de recetas.");
        assert_eq!(response.model, "gemma3n:e4b");
        assert_eq!(response.usage.unwrap().total_tokens, 128);
    }

    #[test]
    fn missing_fields_fall_back() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        let response = parsed.into_provider_response("requested".into());
        assert_eq!(response.message.content, "");
        assert_eq!(response.model, "requested");
        assert!(response.usage.is_none());
    }
}
