//! Shared test helpers: scripted providers and summarizers.

use crate::summarizer::Summarize;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use ventana_core::error::ProviderError;
use ventana_core::message::Message;
use ventana_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// A provider that answers every request with the same text and records
/// the last request it saw.
pub struct ScriptedProvider {
    reply: String,
    last_request: Mutex<Option<ProviderRequest>>,
    call_count: Mutex<usize>,
}

impl ScriptedProvider {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            last_request: Mutex::new(None),
            call_count: Mutex::new(0),
        }
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.last_request.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.call_count.lock().unwrap() += 1;
        let model = request.model.clone();
        *self.last_request.lock().unwrap() = Some(request);
        Ok(ProviderResponse {
            message: Message::assistant(self.reply.clone()),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// A provider whose every call fails with the given error.
pub struct FailingProvider(pub ProviderError);

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.0.clone())
    }
}

/// A provider that never answers within any reasonable timeout.
pub struct StalledProvider;

#[async_trait]
impl Provider for StalledProvider {
    fn name(&self) -> &str {
        "stalled_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ProviderResponse {
            message: Message::assistant("too late"),
            usage: None,
            model: request.model,
        })
    }
}

/// A summarizer returning a fixed text and counting invocations.
pub struct FixedSummarizer {
    text: String,
    calls: Mutex<Vec<usize>>,
}

impl FixedSummarizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of messages passed on each call, in order.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarize for FixedSummarizer {
    async fn summarize(&self, messages: &[Message]) -> String {
        self.calls.lock().unwrap().push(messages.len());
        self.text.clone()
    }
}

/// `n` alternating user/assistant messages with `words` words each.
pub fn conversation(n: usize, words: usize) -> Vec<Message> {
    (0..n)
        .map(|i| {
            let text = format!("m{i} {}", vec!["palabra"; words].join(" "));
            if i % 2 == 0 {
                Message::user(text)
            } else {
                Message::assistant(text)
            }
        })
        .collect()
}
