use anyhow::{bail, Context};
use clap::Parser;
use landmark_identifier::{
    GeminiClient, IdentifierConfig, ImageUpload, Orchestrator, PipelineOutcome, PresentationState, StatusUpdate,
    Submission,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Identify landmarks in photos with a vision-language model.
#[derive(Parser, Debug)]
#[command(name = "landmark-identifier", version)]
struct Cli {
    /// PNG, JPEG or GIF images, identified one after another
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(long, env = "LANDMARK_CONFIG")]
    config: Option<PathBuf>,

    /// Confidence below which the model is asked to clarify
    #[arg(long)]
    threshold: Option<f64>,

    /// Model name, e.g. gemini-2.0-flash
    #[arg(long)]
    model: Option<String>,

    /// Ranked answers to request per identification
    #[arg(long)]
    max_candidates: Option<usize>,

    /// Per-call timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print outcomes as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = IdentifierConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(threshold) = cli.threshold {
        config.pipeline.confidence_threshold = threshold;
    }
    if let Some(model) = &cli.model {
        config.model.model = model.clone();
    }
    if let Some(max_candidates) = cli.max_candidates {
        config.pipeline.max_candidates = max_candidates;
    }
    if let Some(timeout) = cli.timeout_secs {
        config.pipeline.call_timeout_seconds = timeout;
        config.model.timeout_seconds = timeout;
    }
    config.validate().context("invalid configuration")?;

    let client = GeminiClient::new(config.model.clone()).context("failed to set up the model client")?;
    let orchestrator = Orchestrator::new(Arc::new(client), config.pipeline.clone())?;
    let watcher = tokio::spawn(report_progress(orchestrator.subscribe()));

    let mut failures = 0;
    for path in &cli.images {
        let outcome = match ImageUpload::from_path(path, config.pipeline.max_image_bytes).await {
            Ok(upload) => match orchestrator.submit(upload).await {
                Submission::Completed { outcome, .. } => outcome,
                Submission::Superseded { run, by } => {
                    warn!("{} was superseded by {}", run, by);
                    continue;
                }
            },
            Err(e) => PipelineOutcome::Failed(e.to_failure()),
        };

        if !outcome.is_success() {
            failures += 1;
        }
        print_outcome(path, &outcome, cli.json)?;
    }

    watcher.abort();

    if failures > 0 {
        bail!("{} of {} images could not be identified", failures, cli.images.len());
    }
    Ok(())
}

async fn report_progress(mut status: watch::Receiver<StatusUpdate>) {
    let mut loading = false;
    while status.changed().await.is_ok() {
        let presentation = status.borrow_and_update().presentation();
        match presentation {
            PresentationState::Loading if !loading => {
                loading = true;
                info!("Identifying your landmark, please wait...");
            }
            PresentationState::Loading => {}
            _ => loading = false,
        }
    }
}

fn print_outcome(path: &std::path::Path, outcome: &PipelineOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match outcome {
        PipelineOutcome::Succeeded(record) => {
            println!("{}: {}", path.display(), record);
            if record.clarified {
                println!("  AI is not very confident about this result. It might be inaccurate.");
                if record.candidates.len() > 1 {
                    let others: Vec<String> = record
                        .candidates
                        .iter()
                        .filter(|c| c.name != record.landmark)
                        .map(|c| format!("{} ({})", c.name, c.confidence))
                        .collect();
                    println!("  Other candidates: {}", others.join(", "));
                }
            }
        }
        PipelineOutcome::Failed(failure) => {
            error!("{}: {}", path.display(), failure);
            println!("{}: Error: {}", path.display(), failure);
        }
    }
    Ok(())
}
