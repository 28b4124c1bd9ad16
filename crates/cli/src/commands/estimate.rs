//! `ventana estimate`: Token estimate of a text.

use super::load_config;
use std::path::Path;
use ventana_context::TokenEstimator;

pub fn run(config_path: Option<&Path>, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let estimator = TokenEstimator::from_config(&config.context);
    println!("{}", estimator.estimate(text));
    Ok(())
}
