//! `ventana stats`: Token statistics for a request document.

use super::{load_config, read_request};
use std::path::Path;
use ventana_context::{ContextStats, TokenEstimator};

pub fn run(config_path: Option<&Path>, input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let request = read_request(input)?;

    let estimator = TokenEstimator::from_config(&config.context);
    let stats = ContextStats::compute(
        &estimator,
        config.context.max_tokens,
        &request.messages,
        &request.attachments,
    );
    let breakdown = estimator.breakdown(&request.messages, &request.attachments);

    let rendered = serde_json::to_string_pretty(&stats).map_err(ventana_core::Error::from)?;
    println!("{rendered}");
    eprintln!(
        "breakdown: {} message, {} image, {} attachment tokens (fingerprint {})",
        breakdown.messages_tokens,
        breakdown.images_tokens,
        breakdown.files_tokens,
        request.fingerprint()?,
    );
    Ok(())
}
