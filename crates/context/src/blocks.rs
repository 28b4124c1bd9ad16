//! Rendering of the final context string.
//!
//! The context is a sequence of labeled blocks in a fixed order. A block
//! with nothing to show is left out entirely; the rest are joined by a
//! blank line:
//!
//! ```text
//! [INSTRUCCIONES SISTEMA]
//! [CONTEXTO RESUMIDO]
//! [ADJUNTOS PROCESADOS]
//! [IMÁGENES ADJUNTAS]
//! [CHAT RECIENTE]
//! ```
//!
//! Images are listed by name and size only. Their bytes never reach the
//! context; the downstream model receives them out of band.

use crate::token::TOKENS_PER_IMAGE;
use ventana_core::attachment::{AttachmentPayload, AttachmentState, ProcessedAttachment};
use ventana_core::message::Message;

const BLOCK_SEPARATOR: &str = "\n\n";
const IMAGES_INTRO: &str = "Las siguientes imágenes están disponibles para análisis:";
const IMAGE_RESOLUTION: &str = "896x896";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    SystemInstructions,
    Summary,
    Attachments,
    Images,
    RecentChat,
}

impl BlockKind {
    pub fn header(&self) -> &'static str {
        match self {
            Self::SystemInstructions => "[INSTRUCCIONES SISTEMA]",
            Self::Summary => "[CONTEXTO RESUMIDO]",
            Self::Attachments => "[ADJUNTOS PROCESADOS]",
            Self::Images => "[IMÁGENES ADJUNTAS]",
            Self::RecentChat => "[CHAT RECIENTE]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub body: String,
}

impl Block {
    fn new(kind: BlockKind, body: String) -> Self {
        Self { kind, body }
    }

    pub fn render(&self) -> String {
        format!("{}\n{}", self.kind.header(), self.body)
    }
}

/// Blocks in render order, already filtered of empty ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledBlocks {
    blocks: Vec<Block>,
}

impl AssembledBlocks {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn kinds(&self) -> Vec<BlockKind> {
        self.blocks.iter().map(|b| b.kind).collect()
    }

    pub fn get(&self, kind: BlockKind) -> Option<&Block> {
        self.blocks.iter().find(|b| b.kind == kind)
    }

    pub fn render(&self) -> String {
        self.blocks
            .iter()
            .map(Block::render)
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR)
    }
}

/// Renders the five context blocks.
#[derive(Debug, Clone, Copy)]
pub struct BlockAssembler {
    tokens_per_image: usize,
}

impl Default for BlockAssembler {
    fn default() -> Self {
        Self::new(TOKENS_PER_IMAGE)
    }
}

impl BlockAssembler {
    pub fn new(tokens_per_image: usize) -> Self {
        Self { tokens_per_image }
    }

    pub fn assemble(
        &self,
        preamble: Option<&str>,
        summary: Option<&str>,
        attachments: &[ProcessedAttachment],
        messages: &[Message],
    ) -> AssembledBlocks {
        let candidates = [
            preamble
                .filter(|p| !p.is_empty())
                .map(|p| Block::new(BlockKind::SystemInstructions, p.to_string())),
            summary
                .filter(|s| !s.is_empty())
                .map(|s| Block::new(BlockKind::Summary, s.to_string())),
            self.attachments_block(attachments),
            self.images_block(attachments),
            self.chat_block(messages),
        ];

        AssembledBlocks {
            blocks: candidates.into_iter().flatten().collect(),
        }
    }

    fn attachments_block(&self, attachments: &[ProcessedAttachment]) -> Option<Block> {
        let items: Vec<String> = attachments
            .iter()
            .filter_map(|a| match &a.state {
                AttachmentState::Processed(payload) => render_attachment(&a.filename, payload),
                AttachmentState::Failed { .. } => None,
            })
            .collect();

        if items.is_empty() {
            return None;
        }
        Some(Block::new(BlockKind::Attachments, items.join(BLOCK_SEPARATOR)))
    }

    fn images_block(&self, attachments: &[ProcessedAttachment]) -> Option<Block> {
        let lines: Vec<String> = attachments
            .iter()
            .filter(|a| a.is_processed_image())
            .map(|a| {
                format!(
                    "- {} ({} bytes, normalizada a {IMAGE_RESOLUTION}, {} tokens)",
                    a.filename, a.size_bytes, self.tokens_per_image
                )
            })
            .collect();

        if lines.is_empty() {
            return None;
        }
        Some(Block::new(
            BlockKind::Images,
            format!("{IMAGES_INTRO}\n{}", lines.join("\n")),
        ))
    }

    fn chat_block(&self, messages: &[Message]) -> Option<Block> {
        if messages.is_empty() {
            return None;
        }
        let lines: Vec<String> = messages.iter().map(render_message).collect();
        Some(Block::new(BlockKind::RecentChat, lines.join(BLOCK_SEPARATOR)))
    }
}

/// `[ROLE]: content` with the role label uppercased.
pub fn render_message(message: &Message) -> String {
    format!("[{}]: {}", message.role_label(), message.content)
}

fn render_attachment(filename: &str, payload: &AttachmentPayload) -> Option<String> {
    let item = match payload {
        AttachmentPayload::Image => return None,
        AttachmentPayload::Audio { transcription } => format!("Audio {filename}:\n{transcription}"),
        AttachmentPayload::Pdf { extracted_text } => format!("PDF {filename}:\n{extracted_text}"),
        AttachmentPayload::Text { extracted_text } => {
            format!("Archivo {filename}:\n{extracted_text}")
        }
        AttachmentPayload::Other { description } => format!(
            "Archivo {filename}: {}",
            description.as_deref().unwrap_or("Procesado")
        ),
    };
    Some(item)
}
