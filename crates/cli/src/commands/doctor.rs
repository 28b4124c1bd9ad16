//! `ventana doctor`: Diagnose configuration and summarizer health.

use super::load_config;
use std::path::Path;
use ventana_config::{AppConfig, SummarizerKind};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Ventana Doctor");
    println!("================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if !path.exists() {
        println!("  ⚠️  No config file at {}, using defaults", path.display());
    }

    let config = match load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            return Err(e.into());
        }
    };

    println!(
        "  ℹ️  Budget {} tokens, keep last {} messages, ceiling {}",
        config.context.max_tokens,
        config.context.preserve_recent_messages,
        config.context.context_ceiling_tokens
    );

    match config.summarizer.kind {
        SummarizerKind::Extractive => {
            println!("  ✅ Extractive summarizer (offline)");
        }
        SummarizerKind::Model => {
            let provider = ventana_providers::build_from_config(&config.summarizer);
            match provider.health_check().await {
                Ok(true) => println!(
                    "  ✅ Summarizer {} reachable (model {})",
                    provider.name(),
                    config.summarizer.model
                ),
                Ok(false) => {
                    println!("  ⚠️  Summarizer {} answered but is not healthy", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Summarizer {} unreachable: {e}", provider.name());
                    println!("     Summaries will fall back to a fixed notice.");
                    issues += 1;
                }
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
