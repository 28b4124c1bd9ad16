//! Text-completion provider implementations for Ventana.
//!
//! All providers implement the `ventana_core::Provider` trait.
//! The router builds the correct provider from configuration.

pub mod ollama;
pub mod openai_compat;
pub mod router;

pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
