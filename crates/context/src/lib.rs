//! Bounded context assembly: the heart of Ventana.
//!
//! Turns an unbounded chat history plus processed attachments into one
//! text context that fits a model's window:
//!
//! 1. **Measure** messages, images and attachment text with the heuristic
//!    [`TokenEstimator`]
//! 2. **Window**: when over budget, keep the last N messages verbatim and
//!    hand the older ones to a [`Summarize`] implementation
//! 3. **Render** the labeled blocks (instructions, summary, attachments,
//!    images, recent chat)
//! 4. **Report** the final estimate and whether it fits the model ceiling
//!
//! Nothing here is stateful; a [`ContextGenerator`] can be shared freely.

pub mod blocks;
pub mod extractive;
pub mod generator;
pub mod request;
pub mod stats;
pub mod summarizer;
pub mod token;
pub mod window;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use blocks::{AssembledBlocks, Block, BlockAssembler, BlockKind};
pub use extractive::ExtractiveSummarizer;
pub use generator::ContextGenerator;
pub use request::{ContextRequest, ContextResult};
pub use stats::ContextStats;
pub use summarizer::{ModelSummarizer, Summarize};
pub use token::{TokenBreakdown, TokenEstimator, estimate_tokens};
pub use window::{PendingSummary, RecentOnlyReason, WindowOutcome, WindowPlan, WindowPolicy};
