//! `ventana build`: Assemble a bounded context.

use super::{load_config, read_request, summarizer_for};
use std::path::Path;
use ventana_context::ContextGenerator;

pub async fn run(
    config_path: Option<&Path>,
    input: &str,
    system: Option<String>,
    json: bool,
    extractive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let mut request = read_request(input)?;
    if system.is_some() {
        request.system_preamble = system;
    }

    let summarizer = summarizer_for(&config.summarizer, extractive);
    let generator = ContextGenerator::new(config.context, summarizer);
    let result = generator.build_request(&request).await;

    if json {
        let rendered = serde_json::to_string_pretty(&result).map_err(ventana_core::Error::from)?;
        println!("{rendered}");
    } else {
        println!("{}", result.context);
        eprintln!(
            "\n{} tokens estimated, {} blocks, {} messages, {} files{}{}",
            result.estimated_tokens,
            result.blocks_count,
            result.messages_count,
            result.files_count,
            if result.summary_used { ", summarized" } else { "" },
            if result.within_limits { "" } else { ", OVER MODEL LIMIT" },
        );
    }

    Ok(())
}
