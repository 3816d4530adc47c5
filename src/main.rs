mod adapters;
mod bedrock;
mod checkpoint;
mod cli;
mod config;
mod cost;
mod error;
mod fetch;
mod orchestrator;
mod prompt;
mod registry;
mod state_machine;
mod ui;
mod writer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use tracing_subscriber::EnvFilter;

use bedrock::BedrockClient;
use checkpoint::Checkpoint;
use cli::{Cli, Command};
use config::LabelscribeConfig;
use fetch::HttpImageFetcher;
use orchestrator::{Orchestrator, RunPolicy, StepOutcome, StepStart};
use prompt::Prompt;
use registry::{ModelRegistry, ModelSpec};
use state_machine::{Decision, RunState};
use ui::RunProgress;
use writer::{JsonDirWriter, OutputFormat, export};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = LabelscribeConfig::load()?;
    if let Some(max_attempts) = cli.max_attempts {
        config.max_attempts = max_attempts;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if let Some(registry) = cli.registry {
        config.registry_path = registry;
    }

    match cli.command {
        Command::Models => {
            let registry = ModelRegistry::load(&config.registry_path)?;
            ui::print_models(registry.models());
        }
        Command::Run {
            urls,
            prompt,
            model,
            checkpoint,
            format,
        } => {
            let registry = ModelRegistry::load(&config.registry_path)?;
            let spec = registry.find(&model)?.clone();

            let url_text = std::fs::read_to_string(&urls)
                .with_context(|| format!("cannot read URL list {}", urls.display()))?;
            let state = RunState::initialize(read_url_list(&url_text), config.max_attempts)?;

            let prompt_text = std::fs::read_to_string(&prompt)
                .with_context(|| format!("cannot read prompt {}", prompt.display()))?;
            let prompt_name = prompt
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let mut checkpoint_data =
                Checkpoint::new(spec.model_id.clone(), prompt_name, prompt_text, state);
            let checkpoint_path = checkpoint.unwrap_or_else(|| {
                config
                    .output_dir
                    .join("checkpoints")
                    .join(format!("{}.json", checkpoint_data.run_id))
            });
            drive(&config, spec, &mut checkpoint_data, &checkpoint_path, format).await?;
        }
        Command::Resume { checkpoint, format } => {
            let mut checkpoint_data = Checkpoint::load(&checkpoint)?;
            let registry = ModelRegistry::load(&config.registry_path)?;
            let spec = registry.find(&checkpoint_data.model_id)?.clone();
            drive(&config, spec, &mut checkpoint_data, &checkpoint, format).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "labelscribe=debug"
    } else {
        "labelscribe=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// One entry per non-blank line; `#` starts a comment line.
fn read_url_list(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect()
}

/// Step the run to completion, checkpointing after every step and asking the
/// operator whenever the run pauses.
async fn drive(
    config: &LabelscribeConfig,
    spec: ModelSpec,
    checkpoint: &mut Checkpoint,
    checkpoint_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let timeout = config.request_timeout();
    let api_key = config.require_api_key()?.to_string();
    let invoker = match &config.endpoint {
        Some(endpoint) => BedrockClient::with_base_url(api_key, endpoint.clone(), timeout)?,
        None => BedrockClient::new(api_key, &config.region, timeout)?,
    };
    let fetcher = HttpImageFetcher::new(timeout, config.image_cache_dir.clone())?;
    let writer = JsonDirWriter::new(&config.output_dir);
    let prompt = Prompt::parse(&checkpoint.prompt_text);

    let orch = Orchestrator::new(spec, prompt, invoker, fetcher, writer)?.with_policy(RunPolicy {
        pause_on_fetch_failure: config.pause_on_fetch_failure,
    });

    tracing::info!(
        run_id = %checkpoint.run_id,
        model = %orch.spec().model_id,
        jobs = checkpoint.state.jobs().len(),
        checkpoint = %checkpoint_path.display(),
        "starting run"
    );

    let term = Term::stdout();
    let progress = RunProgress::start(&checkpoint.state, &orch.spec().display_name);

    loop {
        let (outcome, started) = match orch.begin_step(&mut checkpoint.state)? {
            StepStart::Idle(outcome) => (outcome, None),
            StepStart::Started(job) => {
                // Persist the in-progress job and its attempt before any remote call.
                checkpoint.save(checkpoint_path)?;
                let id = job.id.clone();
                (orch.finish_step(&mut checkpoint.state, job).await?, Some(id))
            }
        };
        checkpoint.save(checkpoint_path)?;
        tracing::debug!(%outcome, "step finished");

        match outcome {
            StepOutcome::Advanced => {
                if let Some(id) = started
                    && let Some(job) = checkpoint.state.job(&id)
                {
                    progress.job_finished(&checkpoint.state, job);
                }
            }
            StepOutcome::Paused => {
                progress.paused(&checkpoint.state);
                let decision = progress.ask_decision(&term)?;
                orch.resume(&mut checkpoint.state, decision)?;
                checkpoint.save(checkpoint_path)?;

                if decision == Decision::Wait {
                    progress.finish();
                    println!(
                        "Run saved. Continue with: labelscribe resume {}",
                        checkpoint_path.display()
                    );
                    return Ok(());
                }
            }
            StepOutcome::Exhausted => break,
        }
    }
    progress.finish();

    let export_path: PathBuf = config
        .output_dir
        .join(format!("combined_{}.{}", checkpoint.run_id, format.extension()));
    let exported = export(&checkpoint.state, format, &export_path)?;
    ui::print_summary(&checkpoint.state.summary());
    println!(
        "\n{exported} transcription(s) exported to {}",
        export_path.display()
    );
    Ok(())
}
