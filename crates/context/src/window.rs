//! Sliding-window policy.
//!
//! Picks which messages survive when a conversation exceeds the token
//! budget. The decision is an ordered ladder; each rung is one
//! [`WindowOutcome`] variant and fires only when every rung above it
//! declined:
//!
//! 1. `FullHistory`: the whole conversation fits.
//! 2. `HardTruncated`: even the last N messages overflow, keep the last 3.
//! 3. `RecentOnly`: the last N messages fit but nothing else does, or the
//!    summary of the older part came back too large.
//! 4. `Summarized`: a system message with the summary, then the last N.
//!
//! The last N messages are always kept verbatim when they fit at all.
//!
//! [`WindowPolicy::plan`] is synchronous and stops before the summarizer
//! call, returning a [`PendingSummary`] the caller can resolve with any
//! [`Summarize`] implementation. [`WindowPolicy::apply`] runs the full ladder.

use crate::summarizer::Summarize;
use crate::token::TokenEstimator;
use serde::Serialize;
use tracing::{debug, warn};
use ventana_config::ContextConfig;
use ventana_core::message::Message;

/// Why the window fell back to the recent messages alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RecentOnlyReason {
    /// The recent messages plus the safety buffer already use the budget.
    NoRoomForSummary { recent_tokens: usize },
    /// The summary was produced but does not fit in the remaining budget.
    SummaryTooLarge {
        summary_tokens: usize,
        remaining: usize,
    },
}

/// The rung of the ladder that produced the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowOutcome {
    FullHistory(Vec<Message>),
    HardTruncated {
        messages: Vec<Message>,
        recent_tokens: usize,
    },
    RecentOnly {
        messages: Vec<Message>,
        reason: RecentOnlyReason,
    },
    /// `messages` starts with the summary as a system message.
    Summarized {
        summary: String,
        messages: Vec<Message>,
    },
}

impl WindowOutcome {
    pub fn messages(&self) -> &[Message] {
        match self {
            Self::FullHistory(messages)
            | Self::HardTruncated { messages, .. }
            | Self::RecentOnly { messages, .. }
            | Self::Summarized { messages, .. } => messages,
        }
    }

    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Self::FullHistory(messages)
            | Self::HardTruncated { messages, .. }
            | Self::RecentOnly { messages, .. }
            | Self::Summarized { messages, .. } => messages,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            Self::Summarized { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Short name of the rung, for logs and CLI output.
    pub fn rung(&self) -> &'static str {
        match self {
            Self::FullHistory(_) => "full_history",
            Self::HardTruncated { .. } => "hard_truncated",
            Self::RecentOnly { .. } => "recent_only",
            Self::Summarized { .. } => "summarized",
        }
    }

    /// Whether history was lost without a summary standing in for it.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::HardTruncated { .. } | Self::RecentOnly { .. })
    }
}

/// The ladder stopped at the summarization rung.
#[derive(Debug, Clone, Copy)]
pub struct PendingSummary<'a> {
    /// Messages to summarize.
    pub old: &'a [Message],
    /// Messages kept verbatim after the summary.
    pub recent: &'a [Message],
    /// Budget left for the summary after the recent messages and buffer.
    pub remaining: usize,
    /// Size the summary should aim for. Advisory, not enforced.
    pub target_tokens: usize,
}

/// Result of the synchronous part of the ladder.
#[derive(Debug, Clone)]
pub enum WindowPlan<'a> {
    Done(WindowOutcome),
    NeedsSummary(PendingSummary<'a>),
}

/// Token budget and window size, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct WindowPolicy {
    estimator: TokenEstimator,
    max_tokens: usize,
    preserve_recent: usize,
    summary_target_tokens: usize,
    safety_buffer: usize,
    hard_truncate_keep: usize,
}

impl WindowPolicy {
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            estimator: TokenEstimator::from_config(config),
            max_tokens: config.max_tokens,
            preserve_recent: config.preserve_recent_messages,
            summary_target_tokens: config.summary_target_tokens,
            safety_buffer: config.safety_buffer_tokens,
            hard_truncate_keep: config.hard_truncate_keep,
        }
    }

    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Split into `(old, recent)` where `recent` is the last N messages.
    /// `old` is empty when the conversation has N messages or fewer.
    pub fn split<'a>(&self, messages: &'a [Message]) -> (&'a [Message], &'a [Message]) {
        let at = messages.len().saturating_sub(self.preserve_recent);
        messages.split_at(at)
    }

    /// Walk the ladder up to the summarizer call.
    pub fn plan<'a>(&self, messages: &'a [Message]) -> WindowPlan<'a> {
        let total = self.estimator.messages_tokens(messages);
        if total <= self.max_tokens {
            debug!(total, max = self.max_tokens, "History fits the budget");
            return WindowPlan::Done(WindowOutcome::FullHistory(messages.to_vec()));
        }

        let (old, recent) = self.split(messages);
        let recent_tokens = self.estimator.messages_tokens(recent);

        // With no old history, `recent` is the whole conversation and has
        // already overflowed, so this rung also covers that case.
        if recent_tokens >= self.max_tokens {
            let keep_from = recent.len().saturating_sub(self.hard_truncate_keep);
            let kept = recent[keep_from..].to_vec();
            warn!(
                recent_tokens,
                max = self.max_tokens,
                kept = kept.len(),
                dropped = messages.len() - kept.len(),
                "Recent messages overflow the budget, hard-truncating"
            );
            return WindowPlan::Done(WindowOutcome::HardTruncated {
                messages: kept,
                recent_tokens,
            });
        }

        let remaining = self
            .max_tokens
            .saturating_sub(recent_tokens + self.safety_buffer);
        if remaining == 0 {
            warn!(
                recent_tokens,
                buffer = self.safety_buffer,
                dropped = old.len(),
                "No room left for a summary, keeping recent messages only"
            );
            return WindowPlan::Done(WindowOutcome::RecentOnly {
                messages: recent.to_vec(),
                reason: RecentOnlyReason::NoRoomForSummary { recent_tokens },
            });
        }

        debug!(
            old = old.len(),
            recent = recent.len(),
            remaining,
            target = self.summary_target_tokens,
            "Older history needs a summary"
        );
        WindowPlan::NeedsSummary(PendingSummary {
            old,
            recent,
            remaining,
            target_tokens: self.summary_target_tokens,
        })
    }

    /// Resolve the summarization rung with a produced summary.
    pub fn admit_summary(&self, pending: PendingSummary<'_>, summary: String) -> WindowOutcome {
        let summary_tokens = self.estimator.estimate(&summary);
        if summary_tokens > pending.remaining {
            warn!(
                summary_tokens,
                remaining = pending.remaining,
                "Summary exceeds the remaining budget, discarding it"
            );
            return WindowOutcome::RecentOnly {
                messages: pending.recent.to_vec(),
                reason: RecentOnlyReason::SummaryTooLarge {
                    summary_tokens,
                    remaining: pending.remaining,
                },
            };
        }

        let mut messages = Vec::with_capacity(pending.recent.len() + 1);
        messages.push(Message::system(summary.clone()));
        messages.extend_from_slice(pending.recent);
        WindowOutcome::Summarized { summary, messages }
    }

    /// Run the whole ladder, calling the summarizer only if needed.
    pub async fn apply(&self, messages: &[Message], summarizer: &dyn Summarize) -> WindowOutcome {
        let outcome = match self.plan(messages) {
            WindowPlan::Done(outcome) => outcome,
            WindowPlan::NeedsSummary(pending) => {
                let summary = summarizer.summarize(pending.old).await;
                self.admit_summary(pending, summary)
            }
        };
        debug!(
            rung = outcome.rung(),
            kept = outcome.messages().len(),
            "Window applied"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FixedSummarizer, conversation};

    fn policy(max_tokens: usize, preserve_recent: usize, safety_buffer: usize) -> WindowPolicy {
        WindowPolicy::from_config(&ContextConfig {
            max_tokens,
            preserve_recent_messages: preserve_recent,
            safety_buffer_tokens: safety_buffer,
            ..ContextConfig::default()
        })
    }

    fn holas(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user("hola")
                } else {
                    Message::assistant("hola")
                }
            })
            .collect()
    }

    #[test]
    fn split_keeps_last_n() {
        let p = policy(100, 2, 0);
        let msgs = conversation(5, 1);
        let (old, recent) = p.split(&msgs);
        assert_eq!(old, &msgs[..3]);
        assert_eq!(recent, &msgs[3..]);
    }

    #[test]
    fn split_short_conversation_has_no_old() {
        let p = policy(100, 10, 0);
        let msgs = conversation(3, 1);
        let (old, recent) = p.split(&msgs);
        assert!(old.is_empty());
        assert_eq!(recent.len(), 3);
    }

    #[test]
    fn each_hola_costs_eight() {
        let est = TokenEstimator::default();
        assert_eq!(est.messages_tokens(&holas(4)), 32);
    }

    #[tokio::test]
    async fn full_history_when_within_budget() {
        let summarizer = FixedSummarizer::new("unused");
        let msgs = conversation(3, 5);
        let outcome = WindowPolicy::from_config(&ContextConfig::default())
            .apply(&msgs, &summarizer)
            .await;

        assert_eq!(outcome, WindowOutcome::FullHistory(msgs));
        assert!(summarizer.calls().is_empty());
    }

    #[tokio::test]
    async fn exactly_at_budget_is_full_history() {
        let summarizer = FixedSummarizer::new("unused");
        let outcome = policy(32, 2, 0).apply(&holas(4), &summarizer).await;
        assert_eq!(outcome.rung(), "full_history");
    }

    #[tokio::test]
    async fn hard_truncates_when_recent_overflows() {
        let summarizer = FixedSummarizer::new("unused");
        let msgs = conversation(6, 20);
        let outcome = policy(10, 4, 0).apply(&msgs, &summarizer).await;

        match &outcome {
            WindowOutcome::HardTruncated {
                messages,
                recent_tokens,
            } => {
                assert_eq!(messages.as_slice(), &msgs[3..]);
                assert!(*recent_tokens >= 10);
            }
            other => panic!("expected HardTruncated, got {other:?}"),
        }
        assert!(outcome.is_degraded());
        assert!(summarizer.calls().is_empty());
    }

    #[tokio::test]
    async fn short_overflowing_conversation_is_hard_truncated() {
        let summarizer = FixedSummarizer::new("unused");
        let msgs = conversation(5, 50);
        let outcome = policy(20, 10, 0).apply(&msgs, &summarizer).await;
        assert_eq!(outcome.rung(), "hard_truncated");
        assert_eq!(outcome.messages(), &msgs[2..]);
    }

    #[tokio::test]
    async fn recent_only_when_buffer_leaves_no_room() {
        let summarizer = FixedSummarizer::new("unused");
        let msgs = holas(4);
        // 32 > 30; recent 16 < 30; 30 - (16 + 200) saturates to 0
        let outcome = policy(30, 2, 200).apply(&msgs, &summarizer).await;

        assert_eq!(
            outcome,
            WindowOutcome::RecentOnly {
                messages: msgs[2..].to_vec(),
                reason: RecentOnlyReason::NoRoomForSummary { recent_tokens: 16 },
            }
        );
        assert!(summarizer.calls().is_empty());
    }

    #[tokio::test]
    async fn summarized_prepends_summary_as_system_message() {
        let summarizer = FixedSummarizer::new("resumen corto");
        let msgs = holas(4);
        // remaining = 30 - 16 - 0 = 14; "resumen corto" estimates to 3
        let outcome = policy(30, 2, 0).apply(&msgs, &summarizer).await;

        let kept = outcome.messages();
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0], Message::system("resumen corto"));
        assert_eq!(&kept[1..], &msgs[2..]);
        assert_eq!(outcome.summary(), Some("resumen corto"));
        assert!(!outcome.is_degraded());
        assert_eq!(summarizer.calls(), vec![2]);
    }

    #[tokio::test]
    async fn oversized_summary_is_discarded() {
        let summarizer = FixedSummarizer::new(vec!["palabra"; 100].join(" "));
        let msgs = holas(4);
        let outcome = policy(30, 2, 0).apply(&msgs, &summarizer).await;

        assert_eq!(
            outcome,
            WindowOutcome::RecentOnly {
                messages: msgs[2..].to_vec(),
                reason: RecentOnlyReason::SummaryTooLarge {
                    summary_tokens: 179,
                    remaining: 14,
                },
            }
        );
        assert_eq!(outcome.summary(), None);
    }

    #[test]
    fn plan_stops_before_summarizer() {
        let p = policy(30, 2, 0);
        let msgs = holas(5);
        match p.plan(&msgs) {
            WindowPlan::NeedsSummary(pending) => {
                assert_eq!(pending.old.len(), 3);
                assert_eq!(pending.recent, &msgs[3..]);
                assert_eq!(pending.remaining, 14);
                assert_eq!(pending.target_tokens, 20_000);
            }
            WindowPlan::Done(outcome) => panic!("expected NeedsSummary, got {outcome:?}"),
        }
    }

    #[tokio::test]
    async fn recent_messages_survive_every_rung_that_fits_them() {
        let msgs = conversation(12, 3);
        for max in [20, 60, 120, 200] {
            let p = policy(max, 4, 0);
            let outcome = p.apply(&msgs, &FixedSummarizer::new("r")).await;
            if outcome.rung() == "hard_truncated" || outcome.rung() == "full_history" {
                continue;
            }
            let kept = outcome.messages();
            assert_eq!(&kept[kept.len() - 4..], &msgs[8..], "max = {max}");
        }
    }
}
