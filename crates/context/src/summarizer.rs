//! Summarization of old conversation turns.
//!
//! [`Summarize`] is the seam between the sliding window and whatever
//! produces the summary. Its contract is infallible: an implementation
//! always returns usable text, so a summarization problem degrades the
//! context instead of aborting the request.
//!
//! [`ModelSummarizer`] asks a small model through a [`Provider`] and, on any
//! failure (timeout, transport, malformed or empty reply), substitutes a
//! deterministic one-line fallback naming how many messages were dropped.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use ventana_config::SummarizerConfig;
use ventana_core::error::ProviderError;
use ventana_core::message::Message;
use ventana_core::provider::{Provider, ProviderRequest};

/// Instructions sent to the summarization model.
const SUMMARIZATION_PROMPT: &str = "\
Eres un resumidor experto de conversaciones de chat. Escribe un resumen conciso \
pero completo de la conversación que sigue. El resumen debe conservar:

1. Los puntos clave y los temas principales tratados
2. El contexto necesario para continuar la conversación
3. El tono y el estilo de la conversación
4. La información que pueda ser relevante para respuestas futuras

Responde solo con el resumen, sin preámbulos.";

/// Label opening the transcript.
const TRANSCRIPT_HEADER: &str = "CONVERSACIÓN A RESUMIR:";

/// Cue appended after the transcript.
const SUMMARY_CUE: &str = "RESUMEN CONCISO:";

/// Returned when there is nothing to summarize.
pub const NO_HISTORY_SUMMARY: &str = "No hay conversación previa.";

/// Fallback for a completion that came back empty.
pub fn empty_completion_summary(message_count: usize) -> String {
    format!("Resumen de {message_count} mensajes de conversación previa.")
}

/// Fallback for a failed completion call.
pub fn failed_summary(message_count: usize) -> String {
    format!(
        "Resumen de {message_count} mensajes de conversación previa (error en resumen automático)."
    )
}

/// Produces a short text standing in for a run of old messages.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, messages: &[Message]) -> String;
}

/// Render messages as the `[ROLE]: content` transcript the model reads.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut transcript = String::new();
    for msg in messages {
        transcript.push_str(&format!("[{}]: {}\n\n", msg.role_label(), msg.content));
    }
    transcript
}

/// Summarizer backed by a small language model.
pub struct ModelSummarizer {
    provider: Arc<dyn Provider>,
    config: SummarizerConfig,
}

impl ModelSummarizer {
    pub fn new(provider: Arc<dyn Provider>, config: SummarizerConfig) -> Self {
        Self { provider, config }
    }

    /// Build the one-shot completion request for a span of messages.
    pub fn build_request(&self, messages: &[Message]) -> ProviderRequest {
        let user = format!(
            "{TRANSCRIPT_HEADER}\n{}{SUMMARY_CUE}",
            render_transcript(messages)
        );

        ProviderRequest {
            model: self.config.model.clone(),
            messages: vec![Message::system(SUMMARIZATION_PROMPT), Message::user(user)],
            temperature: self.config.temperature,
            top_p: Some(self.config.top_p),
            max_tokens: Some(self.config.max_output_tokens),
            stop: self.config.stop.clone(),
        }
    }

    async fn try_summarize(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let request = self.build_request(messages);
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let response = tokio::time::timeout(timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(self.config.timeout_secs))??;

        Ok(response.message.content.trim().to_string())
    }
}

#[async_trait]
impl Summarize for ModelSummarizer {
    async fn summarize(&self, messages: &[Message]) -> String {
        if messages.is_empty() {
            return NO_HISTORY_SUMMARY.to_string();
        }

        let count = messages.len();
        match self.try_summarize(messages).await {
            Ok(summary) if summary.is_empty() => {
                warn!(
                    provider = %self.provider.name(),
                    messages = count,
                    "Summarizer returned an empty completion, using fallback"
                );
                empty_completion_summary(count)
            }
            Ok(summary) => {
                info!(
                    messages = count,
                    chars = summary.chars().count(),
                    "Conversation summarized"
                );
                summary
            }
            Err(e) => {
                warn!(
                    provider = %self.provider.name(),
                    messages = count,
                    error = %e,
                    "Summarization failed, using fallback"
                );
                failed_summary(count)
            }
        }
    }
}
