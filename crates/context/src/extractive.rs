//! Deterministic summarizer that needs no model.
//!
//! Lists the first few user requests and the opening of the first few
//! assistant replies. Lossy, but instant and offline.

use crate::summarizer::Summarize;
use async_trait::async_trait;
use tracing::info;
use ventana_core::message::{Message, Role};

const HEADER: &str = "[RESUMEN DE CONVERSACIÓN ANTERIOR]\n";
const USER_TOPICS: usize = 3;
const ASSISTANT_TOPICS: usize = 2;
const REPLY_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    pub fn digest(&self, messages: &[Message]) -> String {
        if messages.is_empty() {
            return String::new();
        }

        let mut user = Vec::new();
        let mut assistant = Vec::new();
        for msg in messages {
            let content = msg.content.trim();
            if content.is_empty() {
                continue;
            }
            match msg.role {
                Some(Role::User) => user.push(content),
                Some(Role::Assistant) => assistant.push(content),
                Some(Role::System) | None => {}
            }
        }

        let mut parts = Vec::new();
        if !user.is_empty() {
            let mut line = format!(
                "El usuario preguntó sobre: {}",
                user.iter().take(USER_TOPICS).copied().collect::<Vec<_>>().join(", ")
            );
            if user.len() > USER_TOPICS {
                line.push_str(&format!(" y {} temas más", user.len() - USER_TOPICS));
            }
            parts.push(line);
        }
        if !assistant.is_empty() {
            let previews: Vec<String> = assistant
                .iter()
                .take(ASSISTANT_TOPICS)
                .map(|reply| preview(reply))
                .collect();
            let mut line = format!("El asistente respondió sobre: {}", previews.join(", "));
            if assistant.len() > ASSISTANT_TOPICS {
                line.push_str(&format!(
                    " y {} respuestas más",
                    assistant.len() - ASSISTANT_TOPICS
                ));
            }
            parts.push(line);
        }

        let summary = format!("{HEADER}{}", parts.join("\n"));
        info!(
            messages = messages.len(),
            chars = summary.chars().count(),
            "Conversation digested"
        );
        summary
    }
}

fn preview(reply: &str) -> String {
    if reply.chars().count() > REPLY_PREVIEW_CHARS {
        let cut: String = reply.chars().take(REPLY_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        reply.to_string()
    }
}

#[async_trait]
impl Summarize for ExtractiveSummarizer {
    async fn summarize(&self, messages: &[Message]) -> String {
        self.digest(messages)
    }
}
