//! # Ventana Core
//!
//! Domain types, traits, and error definitions for the Ventana context
//! assembler. This crate has **no HTTP or runtime dependencies**: it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The only external capability the assembler needs, a text-completion
//! backend, is defined as a trait here. Implementations live in
//! `ventana-providers`. This enables:
//! - Swapping the summarization backend via configuration
//! - Easy testing with scripted/mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod attachment;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use attachment::{AttachmentKind, AttachmentPayload, AttachmentState, ProcessedAttachment};
pub use error::{Error, InputError, ProviderError, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
