use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use swarm_application::SessionService;
use swarm_core::session::{FailureKind, QueryRequest, SessionFailure};
use swarm_interaction::ScriptedProvider;

use super::load_config;
use crate::render;

#[derive(Args)]
pub struct ReplayArgs {
    /// Transcript file containing the raw model output
    file: PathBuf,

    /// Characters per fragment (defaults to stream.replay_chunk_size)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Fail the session after this many fragments
    #[arg(long)]
    fail_after: Option<usize>,

    /// Pause between fragments, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Print the final snapshot as JSON instead of streaming text
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ReplayArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let transcript = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read transcript {}", args.file.display()))?;

    let chunk_size = args
        .chunk_size
        .unwrap_or(config.stream.replay_chunk_size);
    let mut provider = ScriptedProvider::from_transcript(&transcript, chunk_size);
    if let Some(count) = args.fail_after {
        provider = provider.failing_after(
            count,
            SessionFailure::new(FailureKind::Unknown, "replay interrupted"),
        );
    }
    if args.delay_ms > 0 {
        provider = provider.with_delay(Duration::from_millis(args.delay_ms));
    }

    tracing::info!(
        "[Replay] {} fragments of {} chars from {}",
        provider.steps().len(),
        chunk_size,
        args.file.display()
    );

    let query = args
        .file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "replay".to_string());
    let request = QueryRequest::new(query).with_config(config.query_config());

    let service = SessionService::new(provider);
    render::stream_session(&service, request, args.json).await
}
