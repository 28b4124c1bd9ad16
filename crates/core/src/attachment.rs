//! Processed attachment records.
//!
//! The attachment pipeline (transcription, PDF extraction, file-type
//! classification) runs upstream; the assembler only sees its results. On
//! the wire a record is a flat object tagged by `type`:
//!
//! ```json
//! {"type": "audio", "filename": "nota.mp3", "size": 48213,
//!  "processed": true, "transcription": "..."}
//! ```
//!
//! In memory it is a closed variant type: a record is either processed with
//! exactly one payload shape for its kind, or failed with an error string.

use serde::{Deserialize, Serialize};

/// The classification assigned by the upstream file router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
    Pdf,
    Text,
    Other,
}

impl AttachmentKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "image" => Self::Image,
            "audio" => Self::Audio,
            // The router splits PDFs by size; both halves carry extracted text.
            "pdf" | "pdf-small" | "pdf-large" => Self::Pdf,
            "text" => Self::Text,
            _ => Self::Other,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Other => "other",
        }
    }
}

/// Payload of a successfully processed attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentPayload {
    /// Images are never embedded; only a fixed token cost is tracked.
    Image,
    Audio { transcription: String },
    Pdf { extracted_text: String },
    Text { extracted_text: String },
    Other { description: Option<String> },
}

impl AttachmentPayload {
    pub fn kind(&self) -> AttachmentKind {
        match self {
            Self::Image => AttachmentKind::Image,
            Self::Audio { .. } => AttachmentKind::Audio,
            Self::Pdf { .. } => AttachmentKind::Pdf,
            Self::Text { .. } => AttachmentKind::Text,
            Self::Other { .. } => AttachmentKind::Other,
        }
    }
}

/// Outcome of upstream processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentState {
    Processed(AttachmentPayload),
    Failed { kind: AttachmentKind, error: String },
}

/// One previously handled file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AttachmentRecord", into = "AttachmentRecord")]
pub struct ProcessedAttachment {
    pub filename: String,
    pub size_bytes: u64,
    pub state: AttachmentState,
}

impl ProcessedAttachment {
    pub fn processed(
        filename: impl Into<String>,
        size_bytes: u64,
        payload: AttachmentPayload,
    ) -> Self {
        Self {
            filename: filename.into(),
            size_bytes,
            state: AttachmentState::Processed(payload),
        }
    }

    pub fn image(filename: impl Into<String>, size_bytes: u64) -> Self {
        Self::processed(filename, size_bytes, AttachmentPayload::Image)
    }

    pub fn audio(
        filename: impl Into<String>,
        size_bytes: u64,
        transcription: impl Into<String>,
    ) -> Self {
        Self::processed(
            filename,
            size_bytes,
            AttachmentPayload::Audio {
                transcription: transcription.into(),
            },
        )
    }

    pub fn pdf(filename: impl Into<String>, size_bytes: u64, text: impl Into<String>) -> Self {
        Self::processed(
            filename,
            size_bytes,
            AttachmentPayload::Pdf {
                extracted_text: text.into(),
            },
        )
    }

    pub fn text(filename: impl Into<String>, size_bytes: u64, text: impl Into<String>) -> Self {
        Self::processed(
            filename,
            size_bytes,
            AttachmentPayload::Text {
                extracted_text: text.into(),
            },
        )
    }

    pub fn failed(
        kind: AttachmentKind,
        filename: impl Into<String>,
        size_bytes: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            size_bytes,
            state: AttachmentState::Failed {
                kind,
                error: error.into(),
            },
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        match &self.state {
            AttachmentState::Processed(payload) => payload.kind(),
            AttachmentState::Failed { kind, .. } => *kind,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self.state, AttachmentState::Processed(_))
    }

    /// True only for successfully processed images.
    pub fn is_processed_image(&self) -> bool {
        matches!(self.state, AttachmentState::Processed(AttachmentPayload::Image))
    }

    pub fn payload(&self) -> Option<&AttachmentPayload> {
        match &self.state {
            AttachmentState::Processed(payload) => Some(payload),
            AttachmentState::Failed { .. } => None,
        }
    }

    /// Text that the model will read for this attachment, if any.
    ///
    /// `Other` descriptions are a one-line label, not content, and are not
    /// counted.
    pub fn text_payload(&self) -> Option<&str> {
        match self.payload()? {
            AttachmentPayload::Audio { transcription } => Some(transcription),
            AttachmentPayload::Pdf { extracted_text } | AttachmentPayload::Text { extracted_text } => {
                Some(extracted_text)
            }
            AttachmentPayload::Image | AttachmentPayload::Other { .. } => None,
        }
    }
}

// --- Wire format ---

fn default_tag() -> String {
    "other".into()
}

fn default_filename() -> String {
    "unknown".into()
}

/// Flat record as produced by the upstream file router.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AttachmentRecord {
    #[serde(rename = "type", default = "default_tag")]
    kind: String,
    #[serde(default = "default_filename")]
    filename: String,
    #[serde(default, alias = "size")]
    size_bytes: u64,
    #[serde(default)]
    processed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transcription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extracted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<AttachmentRecord> for ProcessedAttachment {
    fn from(record: AttachmentRecord) -> Self {
        let kind = AttachmentKind::from_tag(&record.kind);

        if !record.processed {
            return Self::failed(
                kind,
                record.filename,
                record.size_bytes,
                record.error.unwrap_or_else(|| "not processed".into()),
            );
        }

        // A kind whose expected payload is missing degrades to a labelled
        // `Other` entry rather than an empty section.
        let payload = match (kind, record.transcription, record.extracted_text, record.text_content) {
            (AttachmentKind::Image, ..) => AttachmentPayload::Image,
            (AttachmentKind::Audio, Some(transcription), ..) => {
                AttachmentPayload::Audio { transcription }
            }
            (AttachmentKind::Pdf, _, Some(extracted_text), _) => {
                AttachmentPayload::Pdf { extracted_text }
            }
            (AttachmentKind::Text, _, extracted, content) if content.is_some() || extracted.is_some() => {
                AttachmentPayload::Text {
                    extracted_text: content.or(extracted).unwrap_or_default(),
                }
            }
            _ => AttachmentPayload::Other {
                description: record.description,
            },
        };

        Self::processed(record.filename, record.size_bytes, payload)
    }
}

impl From<ProcessedAttachment> for AttachmentRecord {
    fn from(attachment: ProcessedAttachment) -> Self {
        let mut record = AttachmentRecord {
            kind: attachment.kind().tag().to_string(),
            filename: attachment.filename,
            size_bytes: attachment.size_bytes,
            processed: false,
            transcription: None,
            extracted_text: None,
            text_content: None,
            description: None,
            error: None,
        };

        match attachment.state {
            AttachmentState::Failed { error, .. } => record.error = Some(error),
            AttachmentState::Processed(payload) => {
                record.processed = true;
                match payload {
                    AttachmentPayload::Image => {}
                    AttachmentPayload::Audio { transcription } => {
                        record.transcription = Some(transcription)
                    }
                    AttachmentPayload::Pdf { extracted_text }
                    | AttachmentPayload::Text { extracted_text } => {
                        record.extracted_text = Some(extracted_text)
                    }
                    AttachmentPayload::Other { description } => record.description = description,
                }
            }
        }

        record
    }
}
