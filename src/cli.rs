/// CLI glue for artifact-handoff: command parsing, config loading and wiring
/// of the concrete store, credentials and trainer into the core runner.
///
/// All domain logic lives in `artifact-handoff-core`; this module only
/// assembles it and turns the handoff report into a process exit status.
///
/// Subcommands:
/// - `run`: launch the configured trainer, then locate and publish
/// - `publish`: locate and publish an artifact that already exists
/// - `locate`: print the artifact that would be published
use crate::load_config::{load_config, resolve_upload};
use crate::upload::{EnvCredentials, HttpObjectStore};
use anyhow::{Context, Result};
use artifact_handoff_core::config::HandoffConfig;
use artifact_handoff_core::contract::UploadTarget;
use artifact_handoff_core::events::{HandoffEvents, TracingEvents};
use artifact_handoff_core::handoff::HandoffRunner;
use artifact_handoff_core::locate::{ArtifactLocator, DEFAULT_SUFFIX};
use artifact_handoff_core::publish::Publisher;
use artifact_handoff_core::trainer::{CommandTrainer, Trainer};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// CLI for artifact-handoff: publish the model a training run produced.
#[derive(Parser)]
#[clap(
    name = "artifact-handoff",
    version,
    about = "Run a LoRA trainer, then publish the model artifact it produced to object storage"
)]
pub struct Cli {
    /// Enable debug logging
    #[clap(long, global = true)]
    pub debug: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the configured trainer, then locate and publish its artifact
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Never run the trainer through a shell, whatever the config says
        #[clap(long)]
        no_shell: bool,
        /// Skip the trainer and go straight to the handoff
        #[clap(long)]
        skip_training: bool,
        /// Object key to publish under instead of the artifact's file name
        #[clap(long)]
        key: Option<String>,
    },
    /// Locate and publish an existing artifact
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Object key to publish under instead of the artifact's file name
        #[clap(long)]
        key: Option<String>,
    },
    /// Print the artifact that would be published from a directory
    Locate {
        /// Output directory to scan
        #[clap(long)]
        dir: PathBuf,
        /// Expected model file suffix
        #[clap(long, default_value = DEFAULT_SUFFIX)]
        suffix: String,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<ExitCode> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Run {
            config,
            no_shell,
            skip_training,
            key,
        } => {
            let config = load_config(config)?;
            if skip_training {
                tracing::info!("Skipping trainer as requested");
            } else if let Some(trainer) = config.trainer.clone() {
                let mut trainer = trainer;
                if no_shell {
                    trainer.use_shell = false;
                }
                tokio::task::spawn_blocking(move || CommandTrainer.train(&trainer))
                    .await
                    .context("Trainer task panicked")?
                    .context("Training failed, nothing to publish")?;
            } else {
                tracing::info!("No trainer configured, assuming artifacts are already in place");
            }
            handoff(&config, key).await
        }
        Commands::Publish { config, key } => {
            let config = load_config(config)?;
            if config.upload.is_none() {
                anyhow::bail!("publish requires an upload section in the config");
            }
            handoff(&config, key).await
        }
        Commands::Locate { dir, suffix } => {
            match ArtifactLocator::new(suffix).locate(&dir) {
                Ok(candidate) => {
                    println!("{}", candidate.path().display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(not_found) => {
                    TracingEvents.not_found(&not_found);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

async fn handoff(config: &HandoffConfig, key_override: Option<String>) -> Result<ExitCode> {
    let locator = ArtifactLocator::new(config.suffix.clone());

    let Some(upload) = &config.upload else {
        // Nothing to publish to: report what would have been published.
        return match locator.locate(&config.output_dir) {
            Ok(candidate) => {
                tracing::info!(
                    path = %candidate.path().display(),
                    "No upload configured, artifact left in place"
                );
                println!("{}", serde_json::to_string_pretty(&candidate)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(not_found) => {
                TracingEvents.not_found(&not_found);
                Ok(ExitCode::FAILURE)
            }
        };
    };

    let upload = resolve_upload(upload)?;
    let mut target = UploadTarget::new(upload.bucket.clone())?;
    if let Some(key) = key_override.or(upload.key.clone()) {
        target = target.with_key(key)?;
    }

    let store = HttpObjectStore::new(&upload.endpoint, Duration::from_secs(upload.timeout_secs))?;
    let credentials = EnvCredentials::new_from_env(upload.token_env.clone());
    let runner = HandoffRunner::new(locator, Publisher::new(store, credentials), TracingEvents);

    let report = runner.run(&config.output_dir, &target).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(report.exit_code()))
}
