//! Request and result documents.

use crate::token::TokenBreakdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use ventana_core::attachment::ProcessedAttachment;
use ventana_core::error::InputError;
use ventana_core::message::Message;

/// Everything one `build` call consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextRequest {
    pub messages: Vec<Message>,

    #[serde(default, alias = "files_data")]
    pub attachments: Vec<ProcessedAttachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_preamble: Option<String>,
}

impl ContextRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<ProcessedAttachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.system_preamble = Some(preamble.into());
        self
    }

    /// Decode a request document. A message with neither role nor content
    /// makes the whole document invalid.
    pub fn from_json(input: &str) -> Result<Self, InputError> {
        serde_json::from_str(input).map_err(|e| InputError::Malformed(e.to_string()))
    }

    /// Stable SHA-256 hex digest of the whole request, usable as a cache key.
    pub fn fingerprint(&self) -> ventana_core::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}

/// The assembled context and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextResult {
    pub context: String,
    /// Messages in the working set (after any summarization).
    pub messages_count: usize,
    /// Attachments supplied, failed ones included.
    pub files_count: usize,
    /// Estimate of the rendered context plus the image cost.
    pub estimated_tokens: usize,
    pub within_limits: bool,
    pub summary_used: bool,
    pub blocks_count: usize,
    /// Breakdown of the full input, before any summarization.
    pub token_breakdown: TokenBreakdown,
    pub timestamp: DateTime<Utc>,
}
