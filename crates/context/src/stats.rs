//! Budget statistics without assembling a context.

use crate::token::TokenEstimator;
use serde::{Deserialize, Serialize};
use ventana_core::attachment::ProcessedAttachment;
use ventana_core::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextStats {
    pub total_messages: usize,
    pub total_files: usize,
    pub messages_tokens: usize,
    /// Estimated over each attachment's serialized record.
    pub files_tokens: usize,
    pub total_tokens: usize,
    pub max_tokens: usize,
    pub needs_optimization: bool,
    /// Tokens above the budget, zero when within it.
    pub optimization_savings: usize,
}

impl ContextStats {
    pub fn compute(
        estimator: &TokenEstimator,
        max_tokens: usize,
        messages: &[Message],
        attachments: &[ProcessedAttachment],
    ) -> Self {
        let messages_tokens = estimator.messages_tokens(messages);
        let files_tokens: usize = attachments
            .iter()
            .filter_map(|a| serde_json::to_string(a).ok())
            .map(|record| estimator.estimate(&record))
            .sum();
        let total_tokens = messages_tokens + files_tokens;

        Self {
            total_messages: messages.len(),
            total_files: attachments.len(),
            messages_tokens,
            files_tokens,
            total_tokens,
            max_tokens,
            needs_optimization: total_tokens > max_tokens,
            optimization_savings: total_tokens.saturating_sub(max_tokens),
        }
    }
}
