//! `ventana config`: Print configuration.

use super::load_config;
use std::path::Path;
use ventana_config::AppConfig;

pub fn run(config_path: Option<&Path>, default: bool) -> Result<(), Box<dyn std::error::Error>> {
    if default {
        println!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mut config = load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    if config.summarizer.api_key.is_some() {
        config.summarizer.api_key = Some("***".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
