//! Token estimation utilities.
//!
//! No real tokenizer is used. The estimate is the mean of two heuristics:
//! characters / 3.5 (tuned for Spanish prose, which tokenizes denser than
//! English) and words × 1.3 (sub-word splitting). Both over- and
//! under-estimate on different inputs; averaging them keeps the error
//! within a band that the 200-token safety buffer absorbs in practice.
//!
//! Images cost a flat 256 tokens: the downstream model normalizes every
//! image to 896x896 before tokenizing, so byte size is irrelevant.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use ventana_config::ContextConfig;
use ventana_core::attachment::ProcessedAttachment;
use ventana_core::message::Message;

pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;
pub const DEFAULT_WORD_TOKEN_FACTOR: f64 = 1.3;
pub const MESSAGE_OVERHEAD_TOKENS: usize = 5;
pub const TOKENS_PER_IMAGE: usize = 256;

/// Heuristic token counter. Cheap to copy; holds only the tuning constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenEstimator {
    chars_per_token: f64,
    word_token_factor: f64,
    message_overhead: usize,
    tokens_per_image: usize,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            word_token_factor: DEFAULT_WORD_TOKEN_FACTOR,
            message_overhead: MESSAGE_OVERHEAD_TOKENS,
            tokens_per_image: TOKENS_PER_IMAGE,
        }
    }
}

impl TokenEstimator {
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            chars_per_token: config.chars_per_token,
            word_token_factor: config.word_token_factor,
            message_overhead: config.message_overhead_tokens,
            tokens_per_image: config.tokens_per_image,
        }
    }

    pub fn tokens_per_image(&self) -> usize {
        self.tokens_per_image
    }

    /// Estimate the token count for a string. Truncates toward zero.
    pub fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        let char_estimate = text.chars().count() as f64 / self.chars_per_token;
        let word_estimate = text.split_whitespace().count() as f64 * self.word_token_factor;

        ((char_estimate + word_estimate) / 2.0) as usize
    }

    /// Estimate tokens for a single message including per-message overhead.
    ///
    /// The message is measured as `[role]: content`, the shape it has in
    /// the summarizer transcript.
    pub fn message_tokens(&self, message: &Message) -> usize {
        let rendered = format!("[{}]: {}", message.role_name(), message.content);
        self.estimate(&rendered) + self.message_overhead
    }

    /// Estimate tokens for a slice of messages.
    pub fn messages_tokens(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.message_tokens(m)).sum()
    }

    /// Fixed cost of every successfully processed image.
    pub fn images_tokens(&self, attachments: &[ProcessedAttachment]) -> usize {
        attachments
            .iter()
            .filter(|a| a.is_processed_image())
            .count()
            * self.tokens_per_image
    }

    /// Tokens of the text payloads (transcriptions, extracted text) of
    /// processed non-image attachments.
    pub fn files_tokens(&self, attachments: &[ProcessedAttachment]) -> usize {
        attachments
            .iter()
            .filter_map(|a| a.text_payload())
            .map(|text| self.estimate(text))
            .sum()
    }

    pub fn breakdown(
        &self,
        messages: &[Message],
        attachments: &[ProcessedAttachment],
    ) -> TokenBreakdown {
        TokenBreakdown {
            messages_tokens: self.messages_tokens(messages),
            images_tokens: self.images_tokens(attachments),
            files_tokens: self.files_tokens(attachments),
        }
    }
}

/// Estimate the token count for a string with the default tuning.
pub fn estimate_tokens(text: &str) -> usize {
    TokenEstimator::default().estimate(text)
}

/// Per-category token counts of a full request.
///
/// The total is derived, never stored, so it can't disagree with the parts.
/// It is still emitted as `total_tokens` when serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TokenBreakdown {
    pub messages_tokens: usize,
    pub images_tokens: usize,
    pub files_tokens: usize,
}

impl TokenBreakdown {
    pub fn total_tokens(&self) -> usize {
        self.messages_tokens + self.images_tokens + self.files_tokens
    }
}

impl Serialize for TokenBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TokenBreakdown", 4)?;
        s.serialize_field("messages_tokens", &self.messages_tokens)?;
        s.serialize_field("images_tokens", &self.images_tokens)?;
        s.serialize_field("files_tokens", &self.files_tokens)?;
        s.serialize_field("total_tokens", &self.total_tokens())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ventana_core::attachment::AttachmentKind;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn mean_of_char_and_word_estimates() {
        // 11 chars / 3.5 = 3.14, 2 words * 1.3 = 2.6 → mean 2.87 → 2
        assert_eq!(estimate_tokens("hello world"), 2);
    }

    #[test]
    fn single_char_truncates_to_zero() {
        // 1 / 3.5 = 0.29, 1 * 1.3 = 1.3 → mean 0.79 → 0
        assert_eq!(estimate_tokens("a"), 0);
    }

    #[test]
    fn whitespace_only_counts_chars() {
        // 7 chars / 3.5 = 2.0, 0 words → mean 1.0
        assert_eq!(estimate_tokens("       "), 1);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // "canción" is 7 chars but 8 bytes: 7 / 3.5 = 2.0, 1.3 → 1.65 → 1
        assert_eq!(estimate_tokens("canción"), 1);
    }

    #[test]
    fn hundred_words() {
        let text = vec!["palabra"; 100].join(" ");
        // 799 chars / 3.5 = 228.29, 100 * 1.3 = 130 → 179.14 → 179
        assert_eq!(estimate_tokens(&text), 179);
    }

    #[test]
    fn message_includes_role_and_overhead() {
        let est = TokenEstimator::default();
        // "[user]: hola" → 12 / 3.5 = 3.43, 2 * 1.3 = 2.6 → 3.01 → 3, + 5
        assert_eq!(est.message_tokens(&Message::user("hola")), 8);
    }

    #[test]
    fn message_without_role_counts_empty_label() {
        let est = TokenEstimator::default();
        // "[]: hola" → 8 / 3.5 = 2.29, 2 * 1.3 = 2.6 → 2.44 → 2, + 5
        assert_eq!(est.message_tokens(&Message::unattributed("hola")), 7);
        assert_eq!(est.estimate("[]: hola") + MESSAGE_OVERHEAD_TOKENS, 7);
    }

    #[test]
    fn messages_sum_per_message_costs() {
        let est = TokenEstimator::default();
        let msgs = vec![Message::user("hola"), Message::assistant("buenas tardes")];
        let expected = est.message_tokens(&msgs[0]) + est.message_tokens(&msgs[1]);
        assert_eq!(est.messages_tokens(&msgs), expected);
    }

    #[test]
    fn adding_a_message_never_decreases_total() {
        let est = TokenEstimator::default();
        let mut msgs = Vec::new();
        let mut last = est.messages_tokens(&msgs);
        let long = "x".repeat(1000);
        for text in ["", "a", "una frase corta", long.as_str()] {
            msgs.push(Message::user(text));
            let now = est.messages_tokens(&msgs);
            assert!(now >= last + MESSAGE_OVERHEAD_TOKENS);
            last = now;
        }
    }

    #[test]
    fn images_cost_is_flat_per_processed_image() {
        let est = TokenEstimator::default();
        let attachments = vec![
            ProcessedAttachment::image("a.png", 10),
            ProcessedAttachment::image("b.png", 9_000_000),
            ProcessedAttachment::failed(AttachmentKind::Image, "c.png", 5, "corrupt"),
        ];
        assert_eq!(est.images_tokens(&attachments), 512);
    }

    #[test]
    fn files_tokens_cover_text_payloads_only() {
        let est = TokenEstimator::default();
        let attachments = vec![
            ProcessedAttachment::audio("a.mp3", 1, "hello world"),
            ProcessedAttachment::pdf("b.pdf", 1, "hello world"),
            ProcessedAttachment::image("c.png", 1),
            ProcessedAttachment::failed(AttachmentKind::Pdf, "d.pdf", 1, "encrypted"),
        ];
        assert_eq!(est.files_tokens(&attachments), 4);
    }

    #[test]
    fn breakdown_total_is_sum_of_parts() {
        let est = TokenEstimator::default();
        let breakdown = est.breakdown(
            &[Message::user("hola")],
            &[
                ProcessedAttachment::image("a.png", 1),
                ProcessedAttachment::text("n.txt", 1, "hello world"),
            ],
        );
        assert_eq!(breakdown.messages_tokens, 8);
        assert_eq!(breakdown.images_tokens, 256);
        assert_eq!(breakdown.files_tokens, 2);
        assert_eq!(breakdown.total_tokens(), 266);
    }

    #[test]
    fn breakdown_serializes_derived_total() {
        let breakdown = TokenBreakdown {
            messages_tokens: 1,
            images_tokens: 256,
            files_tokens: 3,
        };
        let v = serde_json::to_value(breakdown).unwrap();
        assert_eq!(v["total_tokens"], 260);
    }

    #[test]
    fn custom_tuning_from_config() {
        let config = ContextConfig {
            tokens_per_image: 100,
            message_overhead_tokens: 0,
            ..ContextConfig::default()
        };
        let est = TokenEstimator::from_config(&config);
        assert_eq!(est.images_tokens(&[ProcessedAttachment::image("a.png", 1)]), 100);
        assert_eq!(est.message_tokens(&Message::user("hola")), 3);
    }
}
