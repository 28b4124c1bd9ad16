//! Context orchestration.
//!
//! [`ContextGenerator::build`] is the single entry point: it measures the
//! full input, summarizes older history when the budget is exceeded,
//! renders the blocks and reports the final estimate.

use crate::blocks::BlockAssembler;
use crate::request::{ContextRequest, ContextResult};
use crate::stats::ContextStats;
use crate::summarizer::Summarize;
use crate::token::TokenEstimator;
use crate::window::{WindowOutcome, WindowPolicy};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ventana_config::ContextConfig;
use ventana_core::attachment::ProcessedAttachment;
use ventana_core::message::Message;

/// Builds bounded contexts. Holds only configuration and the summarizer,
/// so one instance can serve concurrent calls.
pub struct ContextGenerator {
    config: ContextConfig,
    policy: WindowPolicy,
    assembler: BlockAssembler,
    summarizer: Arc<dyn Summarize>,
}

impl ContextGenerator {
    pub fn new(config: ContextConfig, summarizer: Arc<dyn Summarize>) -> Self {
        Self {
            policy: WindowPolicy::from_config(&config),
            assembler: BlockAssembler::new(config.tokens_per_image),
            config,
            summarizer,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn estimator(&self) -> &TokenEstimator {
        self.policy.estimator()
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// Assemble the context for one model call.
    ///
    /// Summarization fires when the estimated total of messages, images and
    /// attachment text exceeds `max_tokens` and there are more messages
    /// than the recent window keeps. The older part is then replaced by a
    /// `[CONTEXTO RESUMIDO]` block. Summarizer failures never surface here;
    /// the fallback text takes the summary's place.
    pub async fn build(
        &self,
        messages: &[Message],
        attachments: &[ProcessedAttachment],
        system_preamble: Option<&str>,
    ) -> ContextResult {
        let breakdown = self.estimator().breakdown(messages, attachments);
        let total = breakdown.total_tokens();
        info!(
            total,
            messages_tokens = breakdown.messages_tokens,
            images_tokens = breakdown.images_tokens,
            files_tokens = breakdown.files_tokens,
            "Building context"
        );

        let needs_summary = total > self.config.max_tokens
            && messages.len() > self.config.preserve_recent_messages;

        let (summary, working) = if needs_summary {
            let (old, recent) = self.policy.split(messages);
            info!(
                total,
                max = self.config.max_tokens,
                old = old.len(),
                recent = recent.len(),
                "Summarizing older history"
            );
            (Some(self.summarizer.summarize(old).await), recent)
        } else {
            debug!(total, max = self.config.max_tokens, "No summary needed");
            (None, messages)
        };

        let blocks = self
            .assembler
            .assemble(system_preamble, summary.as_deref(), attachments, working);
        let context = blocks.render();

        let estimated_tokens = self.estimator().estimate(&context) + breakdown.images_tokens;
        let within_limits = estimated_tokens <= self.config.context_ceiling_tokens;
        if !within_limits {
            warn!(
                estimated_tokens,
                ceiling = self.config.context_ceiling_tokens,
                "Assembled context exceeds the model ceiling"
            );
        }
        info!(
            estimated_tokens,
            blocks = blocks.len(),
            summary_used = needs_summary,
            "Context built"
        );

        ContextResult {
            context,
            messages_count: working.len(),
            files_count: attachments.len(),
            estimated_tokens,
            within_limits,
            summary_used: needs_summary,
            blocks_count: blocks.len(),
            token_breakdown: breakdown,
            timestamp: Utc::now(),
        }
    }

    pub async fn build_request(&self, request: &ContextRequest) -> ContextResult {
        self.build(
            &request.messages,
            &request.attachments,
            request.system_preamble.as_deref(),
        )
        .await
    }

    /// Run the sliding-window ladder alone, without rendering blocks.
    pub async fn apply_window(&self, messages: &[Message]) -> WindowOutcome {
        self.policy.apply(messages, self.summarizer.as_ref()).await
    }

    pub fn stats(&self, messages: &[Message], attachments: &[ProcessedAttachment]) -> ContextStats {
        ContextStats::compute(
            self.estimator(),
            self.config.max_tokens,
            messages,
            attachments,
        )
    }
}
