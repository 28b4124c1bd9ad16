//! Ventana CLI: the main entry point.
//!
//! Commands:
//! - `build`    Assemble a bounded context from a request document
//! - `stats`    Token statistics without assembling
//! - `estimate` Token estimate of a piece of text
//! - `config`   Print the effective or default configuration
//! - `doctor`   Check configuration and summarizer reachability

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "ventana",
    about = "Ventana: bounded context assembler for multimodal chat models",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.ventana/config.toml
    #[arg(long, global = true, env = "VENTANA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the context for a request document
    Build {
        /// Request JSON file, or `-` for stdin
        #[arg(short, long)]
        input: String,

        /// Override the request's system preamble
        #[arg(short, long)]
        system: Option<String>,

        /// Print the full result as JSON instead of the context text
        #[arg(long)]
        json: bool,

        /// Use the offline extractive summarizer regardless of config
        #[arg(long)]
        extractive: bool,
    },

    /// Show token statistics for a request document
    Stats {
        /// Request JSON file, or `-` for stdin
        #[arg(short, long)]
        input: String,
    },

    /// Estimate the token count of a text
    Estimate {
        /// Text to measure
        text: String,
    },

    /// Print configuration as TOML
    Config {
        /// Print the built-in defaults instead of the effective config
        #[arg(long)]
        default: bool,
    },

    /// Diagnose configuration and summarizer health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for the context or JSON.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Build {
            input,
            system,
            json,
            extractive,
        } => commands::build::run(config_path, &input, system, json, extractive).await?,
        Commands::Stats { input } => commands::stats::run(config_path, &input)?,
        Commands::Estimate { text } => commands::estimate::run(config_path, &text)?,
        Commands::Config { default } => commands::config_cmd::run(config_path, default)?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
