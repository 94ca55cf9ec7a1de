//! # deckforge CLI Interface (Module)
//!
//! Command parsing and the async [`run`] entrypoint shared by `main` and the integration
//! tests. All generation logic lives in `deckforge-core`; this module only wires the
//! configuration and service clients together and prints results as JSON on stdout.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deckforge_core::contract::ImageGeneration;
use deckforge_core::pipeline::{validate_request, PresentationPipeline, FAILURE_MESSAGE};
use deckforge_core::providers::{GroqClient, HuggingFaceClient};

use crate::load_config::load_config_or_default;
use crate::status::status_report;

/// CLI for deckforge: turn a topic into a slide deck.
#[derive(Parser)]
#[clap(
    name = "deckforge",
    version,
    about = "Generate a PPTX slide deck from a single topic with hosted language and image models"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a presentation and print the result as JSON
    Generate {
        /// Topic of the presentation
        #[clap(long)]
        topic: String,
        /// Number of slides (3 to 20)
        #[clap(long, default_value_t = 5)]
        slides: usize,
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Report service availability and prepare the output directories
    Status {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate {
            topic,
            slides,
            config,
        } => {
            validate_request(&topic, slides)?;
            let config = load_config_or_default(config.as_deref())?;
            config.trace_loaded();

            let text = GroqClient::from_env(&config)
                .context("a text model is required to generate a presentation")?;
            let images = HuggingFaceClient::from_env(&config)
                .map(|client| Arc::new(client) as Arc<dyn ImageGeneration>);
            if images.is_none() {
                tracing::warn!("HF_TOKEN not set, generating without images");
            }

            tracing::info!(command = "generate", topic = %topic, slides, "Starting generation");
            let pipeline = PresentationPipeline::new(Arc::new(text), images, &config);
            let result = pipeline.run_pipeline(&topic, slides).await;
            println!("{}", serde_json::to_string_pretty(&result)?);

            if !result.succeeded {
                let reason = result.error.unwrap_or_else(|| FAILURE_MESSAGE.to_string());
                anyhow::bail!("{FAILURE_MESSAGE}: {reason}");
            }
            Ok(())
        }
        Commands::Status { config } => {
            let config = load_config_or_default(config.as_deref())?;
            tracing::info!(command = "status", "Checking service status");
            let report = status_report(&config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}
